use crate::core::money::parse_money;
use crate::core::tree::{lookup_path, scalar_to_string};
use crate::models::NormalizedPlan;
use serde_json::Value;

type Aliases = &'static [&'static [&'static str]];

const PLAN_ID: Aliases = &[&["plan_id"], &["planId"], &["id"]];
const PLAN_NAME: Aliases = &[&["plan_name"], &["planName"], &["name"]];
const ISSUER_NAME: Aliases = &[&["issuer_name"], &["issuerName"], &["carrier"]];
const METAL_LEVEL: Aliases = &[&["metal_level"], &["metalLevel"]];
const PREMIUM: Aliases = &[&["premium"], &["monthlyPremium"]];
const DEDUCTIBLE: Aliases = &[&["deductible"], &["cost_sharing", "deductible"]];
const OOP_MAX: Aliases = &[&["oop_max"], &["outOfPocketMax"], &["out_of_pocket_max"]];
const NETWORK: Aliases = &[&["network"], &["networkType"]];

/// Extract the plan list from a search payload: bare array or `plans`
pub fn parse_plan_list(payload: &Value) -> Vec<Value> {
    payload
        .as_array()
        .or_else(|| payload.get("plans").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Map an upstream plan summary onto the normalized shape
pub fn normalize_plan(summary: &Value) -> NormalizedPlan {
    NormalizedPlan {
        plan_id: first_alias(summary, PLAN_ID, scalar_to_string),
        plan_name: first_alias(summary, PLAN_NAME, scalar_to_string),
        issuer_name: first_alias(summary, ISSUER_NAME, scalar_to_string),
        metal_level: first_alias(summary, METAL_LEVEL, scalar_to_string),
        monthly_premium: first_alias(summary, PREMIUM, parse_money),
        deductible: first_alias(summary, DEDUCTIBLE, parse_money),
        out_of_pocket_max: first_alias(summary, OOP_MAX, parse_money),
        network_type: first_alias(summary, NETWORK, scalar_to_string),
    }
}

fn first_alias<T>(summary: &Value, aliases: Aliases, convert: fn(&Value) -> Option<T>) -> Option<T> {
    aliases
        .iter()
        .find_map(|path| lookup_path(summary, path).and_then(convert))
}

/// Parse the comma-separated ages parameter, keeping positive integers
pub fn parse_ages(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(parse_leading_int)
        .filter(|age| *age > 0)
        .filter_map(|age| u32::try_from(age).ok())
        .collect()
}

/// Parse the optional income parameter; anything but a non-negative number is ignored
pub fn parse_income(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

// Leading-integer parse: "7abc" -> 7, "abc" -> None
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
