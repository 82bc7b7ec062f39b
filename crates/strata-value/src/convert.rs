//! Conversions from the document models of the format parsers.

use crate::{Key, Mapping, Value};
use yaml_rust2::Yaml;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (Key::from(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Value {
    /// Convert to a `serde_json::Value`.
    ///
    /// Integer keys become their decimal string; non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Convert a parsed YAML node.
///
/// Aliases are resolved by the YAML loader before they reach this point;
/// anything left unresolved (and bad values) becomes [`Value::Null`].
pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => Value::Null,
        Yaml::Boolean(b) => Value::Bool(*b),
        Yaml::Integer(i) => Value::Int(*i),
        Yaml::Real(s) => s
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| parse_yaml_special_float(s)),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Array(items) => Value::Sequence(items.iter().map(from_yaml).collect()),
        Yaml::Hash(hash) => Value::Mapping(
            hash.iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect::<Mapping>(),
        ),
    }
}

fn parse_yaml_special_float(s: &str) -> Value {
    match s.trim_start_matches(['+', '-']).to_ascii_lowercase().as_str() {
        ".inf" if s.starts_with('-') => Value::Float(f64::NEG_INFINITY),
        ".inf" => Value::Float(f64::INFINITY),
        ".nan" => Value::Float(f64::NAN),
        _ => Value::String(s.to_string()),
    }
}

fn yaml_key(yaml: &Yaml) -> Key {
    match yaml {
        Yaml::Integer(i) => Key::Int(*i),
        Yaml::String(s) | Yaml::Real(s) => Key::from(s.as_str()),
        Yaml::Boolean(b) => Key::Int(i64::from(*b)),
        Yaml::Null => Key::Str(String::new()),
        other => Key::Str(format!("{:?}", other)),
    }
}

/// Convert a parsed TOML value. Datetimes become their RFC 3339 string.
pub fn from_toml(toml: &toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table
                .iter()
                .map(|(k, v)| (Key::from(k.as_str()), from_toml(v)))
                .collect(),
        ),
    }
}
