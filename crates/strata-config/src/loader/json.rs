//! JSON files.

use super::{Loader, has_extension, root_mapping};
use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_value::{Mapping, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Mapping> {
        if content.is_empty() {
            return Ok(Mapping::new());
        }
        let json: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::invalid_content(path, e.to_string()))?;
        root_mapping(path, Value::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    fn parse(content: &str) -> Result<Mapping> {
        JsonLoader.parse(Path::new("test.json"), content)
    }

    #[test]
    fn test_parse_nested() {
        let tree =
            parse(r#"{"db": {"host": "localhost", "port": 3306, "ratio": 0.5}, "debug": false}"#)
                .unwrap();
        assert_eq!(
            tree,
            mapping! {
                "db" => mapping! { "host" => "localhost", "port" => 3306, "ratio" => 0.5 },
                "debug" => false,
            }
        );
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(parse("").unwrap(), Mapping::new());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse("{\"a\": ").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidContent { .. }));
    }

    #[test]
    fn test_scalar_root() {
        assert!(parse("42").is_err());
    }
}
