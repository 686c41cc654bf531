use serde_json::Value;

/// Depth-first search for `key` anywhere below `value`.
///
/// A mapping is checked for a direct entry before its children are visited;
/// children are visited in document order, sequence items in index order.
/// A direct entry holding `null` counts as absent in that mapping, and its
/// children are not searched.
pub fn find_key<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                return (!found.is_null()).then_some(found);
            }
            map.values().find_map(|child| find_key(child, key))
        }
        Value::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}
