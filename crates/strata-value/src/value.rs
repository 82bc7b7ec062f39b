//! Core tree types.

use crate::coerce::format_float;
use indexmap::{Equivalent, IndexMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An ordered mapping of keys to values.
///
/// Insertion order is preserved; inserting an existing key replaces the value
/// in place, keeping the key's original position.
pub type Mapping = IndexMap<Key, Value>;

/// A mapping key: a string or an integer.
///
/// Strings holding a canonical decimal integer (`"0"`, `"42"`, `"-7"`, but not
/// `"007"` or `"+1"`) are normalised to [`Key::Int`] by [`Key::from`], so a key
/// read from JSON text and the same key produced in memory compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Build a string key without integer normalisation.
    pub fn string(s: impl Into<String>) -> Self {
        Key::Str(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Str(_) => None,
        }
    }
}

// Hash only the payload so that `str` can be used for lookups (see the
// `Equivalent` impl below).
impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Int(i) => i.hash(state),
            Key::Str(s) => s.hash(state),
        }
    }
}

impl Equivalent<Key> for str {
    fn equivalent(&self, key: &Key) -> bool {
        matches!(key, Key::Str(s) if s == self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => f.write_str(s),
        }
    }
}

fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let canonical = match digits.as_bytes() {
        [] => false,
        [b'0'] => digits.len() == s.len(),
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
    };
    if canonical { s.parse().ok() } else { None }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        canonical_int(s).map_or_else(|| Key::Str(s.to_string()), Key::Int)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        canonical_int(&s).map_or(Key::Str(s), Key::Int)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::from(s.as_str())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// True for sequences and mappings.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Sequence(_) | Value::Mapping(_))
    }

    /// Look up a string key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Follow a path of string keys (or sequence indices written as digits).
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |current, segment| match current {
            Value::Mapping(map) => map.get(&Key::from(*segment)),
            Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// String form of a string or number, as used when a value is spliced into
    /// a larger string. Other variants have no string form.
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => f.write_str(s),
            Value::Sequence(_) | Value::Mapping(_) => {
                f.write_str(&serde_json::to_string(self).map_err(|_| fmt::Error)?)
            }
        }
    }
}

impl std::ops::Index<&str> for Value {
    type Output = Value;

    /// Index into a mapping by string key; missing keys and non-mappings
    /// yield [`Value::Null`].
    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(key).unwrap_or(&NULL)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;

    #[test]
    fn test_key_normalises_canonical_integers() {
        assert_eq!(Key::from("42"), Key::Int(42));
        assert_eq!(Key::from("-7"), Key::Int(-7));
        assert_eq!(Key::from("0"), Key::Int(0));
        assert_eq!(Key::from("007"), Key::Str("007".into()));
        assert_eq!(Key::from("-0"), Key::Str("-0".into()));
        assert_eq!(Key::from("+1"), Key::Str("+1".into()));
        assert_eq!(Key::from(""), Key::Str(String::new()));
        assert_eq!(Key::from("99999999999999999999"), Key::Str("99999999999999999999".into()));
    }

    #[test]
    fn test_str_lookup_in_mapping() {
        let map = mapping! { "host" => "localhost", 0 => "first" };
        assert_eq!(map.get("host"), Some(&Value::from("localhost")));
        assert_eq!(map.get(&Key::Int(0)), Some(&Value::from("first")));
        assert_eq!(map.get("0"), None);
    }

    #[test]
    fn test_get_path() {
        let tree = Value::from(mapping! {
            "log" => mapping! { "logger" => vec![mapping! { "name" => "default" }] },
        });
        assert_eq!(
            tree.get_path(&["log", "logger", "0", "name"]),
            Some(&Value::from("default"))
        );
        assert_eq!(tree.get_path(&["log", "missing"]), None);
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(Value::Int(1337).scalar_to_string().as_deref(), Some("1337"));
        assert_eq!(Value::Float(32.5).scalar_to_string().as_deref(), Some("32.5"));
        assert_eq!(Value::Float(3.0).scalar_to_string().as_deref(), Some("3"));
        assert_eq!(Value::Bool(true).scalar_to_string(), None);
        assert_eq!(Value::Null.scalar_to_string(), None);
    }

    #[test]
    fn test_insert_existing_key_keeps_position() {
        let mut map = mapping! { "a" => 1, "b" => 2 };
        map.insert(Key::from("a"), Value::Int(3));
        let keys: Vec<_> = map.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map["a"], Value::Int(3));
    }
}
