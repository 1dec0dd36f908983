use serde_json::Value;

/// Parse a currency-like JSON value into a number
///
/// Numbers pass through when finite. Strings keep only digits and `.`
/// before parsing, so `"$1,234.50 "` yields `1234.5` and `"N/A"` yields
/// nothing. Any other JSON kind contributes no value.
pub fn parse_money(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// First key of `keys` on `obj` whose value parses as money
pub fn pick_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| obj.get(*key).and_then(parse_money))
}

/// Smallest strictly positive value, if any
pub fn min_positive<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| *v > 0.0)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_money_strings() {
        assert_eq!(parse_money(&json!("$1,234.50 ")), Some(1234.5));
        assert_eq!(parse_money(&json!("N/A")), None);
        assert_eq!(parse_money(&json!("")), None);
        assert_eq!(parse_money(&json!("1.2.3")), None);
    }

    #[test]
    fn test_parse_money_other_kinds() {
        assert_eq!(parse_money(&json!(250)), Some(250.0));
        assert_eq!(parse_money(&json!(null)), None);
        assert_eq!(parse_money(&json!(true)), None);
        assert_eq!(parse_money(&json!({"amount": 5})), None);
    }

    #[test]
    fn test_min_positive() {
        assert_eq!(min_positive(vec![0.0, 3000.0, 500.0, -1.0]), Some(500.0));
        assert_eq!(min_positive(vec![0.0, -5.0]), None);
        assert_eq!(min_positive(Vec::new()), None);
    }
}
