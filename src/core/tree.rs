use serde_json::Value;

/// How deep the key search descends below the root
pub const MAX_SEARCH_DEPTH: usize = 6;

/// Collect values from every object entry whose key satisfies `key_matches`
///
/// Walks mappings and arrays iteratively. Entries at depth `max_depth`
/// are still inspected but nothing below them is. `extract` turns a
/// matched value into an output; entries it rejects are skipped.
pub fn collect_by_key<T, K, E>(root: &Value, max_depth: usize, key_matches: K, mut extract: E) -> Vec<T>
where
    K: Fn(&str) -> bool,
    E: FnMut(&Value) -> Option<T>,
{
    let mut found = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    if key_matches(key) {
                        if let Some(item) = extract(value) {
                            found.push(item);
                        }
                    }
                    if depth < max_depth && is_container(value) {
                        stack.push((value, depth + 1));
                    }
                }
            }
            Value::Array(items) => {
                if depth < max_depth {
                    stack.extend(items.iter().filter(|v| is_container(v)).map(|v| (v, depth + 1)));
                }
            }
            _ => {}
        }
    }

    found
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Render a scalar JSON value as a string; empty strings count as absent
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Follow a key path through nested objects
pub fn lookup_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}
