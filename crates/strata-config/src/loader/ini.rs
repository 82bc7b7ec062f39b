//! INI files.
//!
//! ```ini
//! ; top-level keys come first
//! name = app
//!
//! [database]
//! host = localhost
//! port = 3306
//! replicas[] = db1
//! replicas[] = db2
//!
//! [cache.redis]
//! connection.host = "127.0.0.1"
//! ```
//!
//! Sections with dots nest (`[cache.redis]` becomes `cache: {redis: ...}`), as
//! do dotted keys. `key[]` appends to a list and `key[name]` sets a list
//! entry; list entries stay strings. Other values are typed: `true`/`false`
//! in any case, canonical integers and floats, everything else a string.

use super::{Loader, has_extension};
use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_value::{Key, Mapping, Value, merge_recursive};

const NEST_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, Default)]
pub struct IniLoader;

impl Loader for IniLoader {
    fn name(&self) -> &'static str {
        "ini"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["ini"])
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Mapping> {
        let raw = parse_raw(content).map_err(|(line, message)| {
            ConfigError::invalid_content(path, format!("line {}: {}", line, message))
        })?;
        nest(raw).map_err(|message| ConfigError::invalid_content(path, message))
    }
}

/// A value as written in the file, before typing.
#[derive(Debug, Clone, PartialEq)]
enum Raw {
    Scalar(String),
    List(Vec<(Key, String)>),
}

/// Entries of a section, or the top-level entries, in file order.
type RawEntries = Vec<(String, Raw)>;

/// The file as written: keys before the first section, then the sections.
#[derive(Debug, Default)]
struct RawIni {
    top: RawEntries,
    sections: Vec<(String, RawEntries)>,
}

/// Tokenize the file. Errors carry the 1-based line number.
fn parse_raw(content: &str) -> std::result::Result<RawIni, (usize, String)> {
    let mut ini = RawIni::default();
    let mut section: Option<usize> = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let Some((name, _)) = rest.split_once(']') else {
                return Err((line_no, format!("unterminated section header `{}`", line)));
            };
            let name = name.trim();
            // A repeated section continues the earlier one.
            let position = ini.sections.iter().position(|(n, _)| n == name);
            section = Some(position.unwrap_or_else(|| {
                ini.sections.push((name.to_string(), Vec::new()));
                ini.sections.len() - 1
            }));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err((line_no, format!("expected `key = value`, found `{}`", line)));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err((line_no, "empty key".to_string()));
        }

        let entries = match section {
            Some(i) => &mut ini.sections[i].1,
            None => &mut ini.top,
        };
        set_entry(entries, key, raw_value(value)).map_err(|m| (line_no, m))?;
    }

    Ok(ini)
}

/// Store `key = value` into `entries`, handling `key[]` and `key[index]`.
fn set_entry(
    entries: &mut RawEntries,
    key: &str,
    value: String,
) -> std::result::Result<(), String> {
    let Some((name, rest)) = key.split_once('[') else {
        match entries.iter_mut().find(|(n, _)| n == key) {
            Some((_, raw)) => *raw = Raw::Scalar(value),
            None => entries.push((key.to_string(), Raw::Scalar(value))),
        }
        return Ok(());
    };

    let Some(index) = rest.strip_suffix(']') else {
        return Err(format!("invalid array key `{}`", key));
    };
    let name = name.trim();
    let position = match entries.iter().position(|(n, _)| n == name) {
        Some(p) => p,
        None => {
            entries.push((name.to_string(), Raw::List(Vec::new())));
            entries.len() - 1
        }
    };
    if !matches!(entries[position].1, Raw::List(_)) {
        entries[position].1 = Raw::List(Vec::new());
    }
    let Raw::List(items) = &mut entries[position].1 else {
        return Err(format!("invalid array key `{}`", key));
    };

    let index = index.trim();
    let key = if index.is_empty() {
        let next = items
            .iter()
            .filter_map(|(k, _)| k.as_int())
            .max()
            .map_or(0, |max| max + 1);
        Key::Int(next)
    } else {
        Key::from(index)
    };
    match items.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => *v = value,
        None => items.push((key, value)),
    }
    Ok(())
}

/// The value part of a line: quotes removed, trailing comment dropped.
fn raw_value(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return rest[..end].to_string();
            }
        }
    }
    match value.find(';') {
        Some(i) => value[..i].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Build the nested tree from the raw entries.
fn nest(raw: RawIni) -> std::result::Result<Mapping, String> {
    let mut config = Mapping::new();

    for (key, value) in raw.top {
        parse_key(&key, value, &mut config)?;
    }

    for (name, entries) in raw.sections {
        let section = parse_section(entries)?;
        if name.contains(NEST_SEPARATOR) {
            let mut nested = section;
            for part in name.rsplit(NEST_SEPARATOR) {
                let mut outer = Mapping::new();
                outer.insert(Key::from(part), Value::Mapping(nested));
                nested = outer;
            }
            config = merge_recursive(vec![config, nested]);
        } else {
            config.insert(Key::from(name), Value::Mapping(section));
        }
    }

    Ok(config)
}

fn parse_section(entries: RawEntries) -> std::result::Result<Mapping, String> {
    let mut config = Mapping::new();
    for (key, raw) in entries {
        parse_key(&key, raw, &mut config)?;
    }
    Ok(config)
}

fn parse_key(key: &str, raw: Raw, config: &mut Mapping) -> std::result::Result<(), String> {
    if let Some((head, tail)) = key.split_once(NEST_SEPARATOR) {
        if head.is_empty() || tail.is_empty() {
            return Err(format!("Invalid key \"{}\"", key));
        }
        let entry = config
            .entry(Key::from(head))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if entry.is_null() {
            *entry = Value::Mapping(Mapping::new());
        }
        return match entry {
            Value::Mapping(inner) => parse_key(tail, raw, inner),
            _ => Err(format!(
                "Cannot create sub-key for \"{}\", as key already exists",
                head
            )),
        };
    }

    let value = match raw {
        Raw::Scalar(s) => type_scalar(s),
        Raw::List(items) => Value::Mapping(
            items
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        ),
    };
    config.insert(Key::from(key), value);
    Ok(())
}

/// Typing of INI scalars: booleans, then integers and floats that print back
/// exactly as written, then strings.
fn type_scalar(s: String) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return Value::Int(i);
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.to_string() == s {
            return Value::Float(f);
        }
    }
    Value::String(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    fn parse(content: &str) -> Result<Mapping> {
        IniLoader.parse(Path::new("test.ini"), content)
    }

    #[test]
    fn test_sections_and_typing() {
        let tree = parse(
            "; comment\n\
             name = app\n\
             \n\
             [database]\n\
             host = localhost\n\
             port = 3306\n\
             ratio = 0.5\n\
             debug = TRUE\n\
             version = 007\n\
             quoted = \"a ; b\"\n\
             trailing = value ; comment\n",
        )
        .unwrap();

        assert_eq!(
            tree,
            mapping! {
                "name" => "app",
                "database" => mapping! {
                    "host" => "localhost",
                    "port" => 3306,
                    "ratio" => 0.5,
                    "debug" => true,
                    "version" => "007",
                    "quoted" => "a ; b",
                    "trailing" => "value",
                },
            }
        );
    }

    #[test]
    fn test_nested_sections_and_keys() {
        let tree = parse(
            "[cache.redis]\n\
             connection.host = 127.0.0.1\n\
             connection.port = 6379\n\
             [cache.file]\n\
             path = /tmp\n",
        )
        .unwrap();

        assert_eq!(
            tree,
            mapping! {
                "cache" => mapping! {
                    "redis" => mapping! {
                        "connection" => mapping! { "host" => "127.0.0.1", "port" => 6379 },
                    },
                    "file" => mapping! { "path" => "/tmp" },
                },
            }
        );
    }

    #[test]
    fn test_array_keys() {
        let tree = parse(
            "[db]\n\
             replicas[] = db1\n\
             replicas[] = 2\n\
             ports[main] = 3306\n",
        )
        .unwrap();

        assert_eq!(
            tree,
            mapping! {
                "db" => mapping! {
                    "replicas" => mapping! { 0 => "db1", 1 => "2" },
                    "ports" => mapping! { "main" => "3306" },
                },
            }
        );
    }

    #[test]
    fn test_invalid_dotted_key() {
        let err = parse("[a]\nfoo. = 1\n").unwrap_err();
        assert!(err.to_string().ends_with("Invalid key \"foo.\""), "{}", err);
    }

    #[test]
    fn test_sub_key_over_scalar() {
        let err = parse("[a]\nfoo = 1\nfoo.bar = 2\n").unwrap_err();
        assert!(
            err.to_string()
                .ends_with("Cannot create sub-key for \"foo\", as key already exists"),
            "{}",
            err
        );
    }

    #[test]
    fn test_syntax_error_names_line() {
        let err = parse("[a]\njust text\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }
}
