// Core transformation exports
pub mod county;
pub mod extract;
pub mod money;
pub mod plans;
pub mod tree;

pub use county::{parse_candidates, select_county, pad_fips, resolve_fips};
pub use extract::{apply_detail, CostField, DEDUCTIBLE, OUT_OF_POCKET_MAX};
pub use money::{parse_money, pick_number, min_positive};
pub use plans::{normalize_plan, parse_plan_list, parse_ages, parse_income};
pub use tree::{collect_by_key, lookup_path, scalar_to_string, MAX_SEARCH_DEPTH};
