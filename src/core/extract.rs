use crate::core::money::{min_positive, parse_money, pick_number};
use crate::core::tree::{collect_by_key, scalar_to_string, MAX_SEARCH_DEPTH};
use crate::models::NormalizedPlan;
use regex::RegexSet;
use serde_json::Value;
use std::sync::LazyLock;

static DEDUCTIBLE_KEYS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([r"(?i)deductible", r"(?i)deduct"]).expect("deductible key patterns")
});

static OOP_MAX_KEYS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)out.*pocket",
        r"(?i)moop",
        r"(?i)oop",
        r"(?i)(max.*out)|(out.*max)",
    ])
    .expect("out-of-pocket key patterns")
});

/// Where to look for one cost-sharing figure in a plan detail record
///
/// Lookups run in order: named keys on the cost-sharing block, named keys
/// on the record root, the structured `deductibles[]`/`moops[]` array,
/// and finally a depth-bounded search over every key matching `patterns`.
pub struct CostField {
    pub cost_sharing_keys: &'static [&'static str],
    pub root_keys: &'static [&'static str],
    pub array_key: &'static str,
    pub patterns: &'static LazyLock<RegexSet>,
}

pub static DEDUCTIBLE: CostField = CostField {
    cost_sharing_keys: &[
        "deductible",
        "medical_deductible",
        "deductible_in_network_individual",
        "individual_deductible_in_network",
        "individual_deductible",
        "embedded_individual_deductible_in_network",
        "combined_deductible_in_network",
    ],
    root_keys: &["deductible", "annual_deductible"],
    array_key: "deductibles",
    patterns: &DEDUCTIBLE_KEYS,
};

pub static OUT_OF_POCKET_MAX: CostField = CostField {
    cost_sharing_keys: &[
        "oop_max",
        "out_of_pocket_max",
        "maximum_out_of_pocket_in_network_individual",
        "individual_moop_in_network",
        "moop_in_network_individual",
        "in_network_moop_individual",
    ],
    root_keys: &["oop_max", "out_of_pocket_max"],
    array_key: "moops",
    patterns: &OOP_MAX_KEYS,
};

impl CostField {
    /// Best-effort extraction of this figure from a detail record
    pub fn extract(&self, detail: &Value) -> Option<f64> {
        self.named(detail)
            .or_else(|| self.from_tiers(detail))
            .or_else(|| self.deep_search(detail))
    }

    /// Fast path over the known key names; only a positive figure counts
    pub fn named(&self, detail: &Value) -> Option<f64> {
        let cost_sharing = cost_sharing_block(detail);
        pick_number(cost_sharing, self.cost_sharing_keys)
            .or_else(|| pick_number(detail, self.root_keys))
            .filter(|v| *v > 0.0)
    }

    /// Minimum positive in-network individual amount from the tier array
    pub fn from_tiers(&self, detail: &Value) -> Option<f64> {
        let tiers = detail.get(self.array_key)?.as_array()?;
        min_positive(
            tiers
                .iter()
                .filter(|tier| is_individual(tier) && is_in_network(tier))
                .filter_map(|tier| tier.get("amount").and_then(parse_money)),
        )
    }

    /// Minimum positive value under any key matching the field's patterns
    pub fn deep_search(&self, detail: &Value) -> Option<f64> {
        let patterns: &RegexSet = self.patterns;
        min_positive(collect_by_key(
            detail,
            MAX_SEARCH_DEPTH,
            |key| patterns.is_match(key),
            parse_money,
        ))
    }
}

fn cost_sharing_block(detail: &Value) -> &Value {
    ["cost_sharing", "costSharing"]
        .iter()
        .find_map(|key| detail.get(*key).filter(|v| !v.is_null()))
        .unwrap_or(detail)
}

fn is_individual(tier: &Value) -> bool {
    tier.get("individual").and_then(Value::as_bool) == Some(true)
        || text_contains(tier.get("family_cost"), "individual")
}

fn is_in_network(tier: &Value) -> bool {
    text_contains(tier.get("network_tier"), "in-network")
}

fn text_contains(value: Option<&Value>, needle: &str) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.to_ascii_lowercase().contains(needle))
}

/// Fill whatever the plan is missing from its matched detail record
pub fn apply_detail(plan: &mut NormalizedPlan, detail: &Value) {
    if plan.deductible.is_none() {
        plan.deductible = DEDUCTIBLE.extract(detail);
    }
    if plan.out_of_pocket_max.is_none() {
        plan.out_of_pocket_max = OUT_OF_POCKET_MAX.extract(detail);
    }
    if plan.network_type.is_none() {
        plan.network_type = ["network", "network_type"]
            .iter()
            .find_map(|key| detail.get(*key).and_then(scalar_to_string));
    }
}
