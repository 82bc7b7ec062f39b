//! Merging configuration trees.
//!
//! Two flavours are provided:
//!
//! - [`merge_recursive`] combines trees loaded from several files. String keys
//!   present on both sides are merged; clashing scalars are collected into a
//!   sequence rather than overwritten, and integer keys are appended.
//! - [`merge_replace`] layers trees by priority: mappings merge key by key,
//!   anything else from the later tree replaces the earlier value.

use crate::{Key, Mapping, Value};

/// Merge mappings in order, collecting clashing values.
///
/// ```rust
/// use strata_value::{mapping, merge_recursive, Value};
///
/// let merged = merge_recursive(vec![
///     mapping! { "level" => 1, "paths" => vec!["a"] },
///     mapping! { "level" => 2, "paths" => vec!["b"] },
/// ]);
///
/// assert_eq!(merged["level"], Value::from(vec![1, 2]));
/// assert_eq!(merged["paths"], Value::from(vec!["a", "b"]));
/// ```
pub fn merge_recursive(layers: Vec<Mapping>) -> Mapping {
    layers
        .into_iter()
        .fold(None, |acc: Option<Mapping>, layer| {
            Some(match acc {
                None => renumber(layer),
                Some(acc) => merge_entries(acc, layer),
            })
        })
        .unwrap_or_default()
}

fn renumber(map: Mapping) -> Mapping {
    merge_entries(Mapping::new(), map)
}

fn next_index(map: &Mapping) -> i64 {
    map.keys()
        .filter_map(Key::as_int)
        .filter(|i| *i >= 0)
        .max()
        .map_or(0, |max| max + 1)
}

fn merge_entries(mut left: Mapping, right: Mapping) -> Mapping {
    for (key, value) in right {
        match key {
            Key::Int(_) => {
                let index = next_index(&left);
                left.insert(Key::Int(index), value);
            }
            Key::Str(_) => match left.get_mut(&key) {
                Some(existing) => {
                    let current = std::mem::take(existing);
                    *existing = merge_values(current, value);
                }
                None => {
                    left.insert(key, value);
                }
            },
        }
    }
    left
}

fn merge_values(left: Value, right: Value) -> Value {
    from_entries(merge_entries(into_entries(left), into_entries(right)))
}

fn into_entries(value: Value) -> Mapping {
    match value {
        Value::Mapping(map) => renumber(map),
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Key::from(i), item))
            .collect(),
        scalar => {
            let mut map = Mapping::new();
            map.insert(Key::Int(0), scalar);
            map
        }
    }
}

fn from_entries(map: Mapping) -> Value {
    let is_list = map
        .keys()
        .enumerate()
        .all(|(i, key)| key.as_int() == i64::try_from(i).ok());
    if is_list && !map.is_empty() {
        Value::Sequence(map.into_values().collect())
    } else {
        Value::Mapping(map)
    }
}

/// Layer mappings by priority: later mappings win.
///
/// ```rust
/// use strata_value::{mapping, merge_replace, Value};
///
/// let merged = merge_replace(vec![
///     mapping! { "db" => mapping! { "host" => "localhost", "port" => 3306 } },
///     mapping! { "db" => mapping! { "port" => 5432 } },
/// ]);
///
/// assert_eq!(merged["db"]["host"], Value::from("localhost"));
/// assert_eq!(merged["db"]["port"], Value::Int(5432));
/// ```
pub fn merge_replace(layers: Vec<Mapping>) -> Mapping {
    layers.into_iter().fold(Mapping::new(), replace_entries)
}

fn replace_entries(mut left: Mapping, right: Mapping) -> Mapping {
    for (key, value) in right {
        let merged = match (left.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                let existing = std::mem::take(existing);
                Value::Mapping(replace_entries(existing, incoming))
            }
            (_, value) => value,
        };
        left.insert(key, merged);
    }
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;

    #[test]
    fn test_merge_recursive_disjoint() {
        let merged = merge_recursive(vec![mapping! { "a" => 1 }, mapping! { "b" => 2 }]);
        assert_eq!(merged, mapping! { "a" => 1, "b" => 2 });
    }

    #[test]
    fn test_merge_recursive_nested_mappings() {
        let merged = merge_recursive(vec![
            mapping! { "connections" => mapping! { "mysql" => mapping! { "host" => "localhost" } } },
            mapping! { "connections" => mapping! { "pgsql" => mapping! { "host" => "db" } } },
        ]);
        assert_eq!(
            merged,
            mapping! {
                "connections" => mapping! {
                    "mysql" => mapping! { "host" => "localhost" },
                    "pgsql" => mapping! { "host" => "db" },
                },
            }
        );
    }

    #[test]
    fn test_merge_recursive_scalar_with_sequence() {
        let merged = merge_recursive(vec![
            mapping! { "a" => vec![1, 2] },
            mapping! { "a" => 3 },
        ]);
        assert_eq!(merged["a"], Value::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_merge_recursive_appends_integer_keys() {
        let merged = merge_recursive(vec![
            mapping! { 0 => "x", "k" => "v" },
            mapping! { 0 => "y" },
        ]);
        assert_eq!(merged, mapping! { 0 => "x", "k" => "v", 1 => "y" });
    }

    #[test]
    fn test_merge_recursive_empty() {
        assert!(merge_recursive(vec![]).is_empty());
    }

    #[test]
    fn test_merge_replace_scalar_over_mapping() {
        let merged = merge_replace(vec![
            mapping! { "a" => mapping! { "b" => 1 } },
            mapping! { "a" => "flat" },
        ]);
        assert_eq!(merged["a"], Value::from("flat"));
    }

    #[test]
    fn test_index_missing_is_null() {
        let v = Value::from(mapping! { "a" => 1 });
        assert!(v["nope"].is_null());
        assert!(Value::Int(1)["a"].is_null());
    }
}
