// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CountyCandidate, NormalizedPlan, Household, Person, Place, PlanSearchBody, PlanDetailsBody, INDIVIDUAL_MARKET};
pub use requests::{PlanSearchQuery, CountyQuery, zip_digits, is_valid_zip};
pub use responses::{PlanSearchResponse, HealthResponse, ErrorResponse};
