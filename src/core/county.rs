use crate::core::tree::scalar_to_string;
use crate::models::CountyCandidate;
use serde_json::Value;

const STATE_KEYS: &[&str] = &["state", "state_code", "usps", "state_abbr"];
const FIPS_KEYS: &[&str] = &["countyfips", "fips", "county_fips", "county_fips_code"];

/// Extract the candidate list from a ZIP lookup payload
///
/// Accepts a bare array or an array under `counties` or `data`.
pub fn parse_candidates(payload: &Value) -> Vec<CountyCandidate> {
    let list = payload
        .as_array()
        .or_else(|| payload.get("counties").and_then(Value::as_array))
        .or_else(|| payload.get("data").and_then(Value::as_array));

    list.map(|items| items.iter().map(CountyCandidate::from_value).collect())
        .unwrap_or_default()
}

impl CountyCandidate {
    pub fn from_value(value: &Value) -> Self {
        Self {
            state: first_string(value, STATE_KEYS),
            fips: first_string(value, FIPS_KEYS),
        }
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value.get(*key).and_then(scalar_to_string))
}

/// Pick the candidate in `state`, falling back to the first one
pub fn select_county<'a>(candidates: &'a [CountyCandidate], state: &str) -> Option<&'a CountyCandidate> {
    candidates
        .iter()
        .find(|c| c.state.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(state.trim())))
        .or_else(|| candidates.first())
}

/// Left-pad a county FIPS code to five characters
pub fn pad_fips(raw: &str) -> String {
    format!("{:0>5}", raw.trim())
}

/// Resolve the padded FIPS code for `state` from a lookup payload
pub fn resolve_fips(payload: &Value, state: &str) -> Option<String> {
    let candidates = parse_candidates(payload);
    select_county(&candidates, state)
        .and_then(|c| c.fips.as_deref())
        .map(pad_fips)
}
