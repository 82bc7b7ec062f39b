//! YAML files.

use super::{Loader, has_extension, root_mapping};
use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_value::{Mapping, Value, from_yaml};
use yaml_rust2::YamlLoader as YamlParser;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLoader;

impl Loader for YamlLoader {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["yml", "yaml"])
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Mapping> {
        let docs = YamlParser::load_from_str(content)
            .map_err(|e| ConfigError::invalid_content(path, e.to_string()))?;

        // Only the first document counts; an empty file has none.
        let root = docs.first().map_or(Value::Null, from_yaml);
        match root {
            Value::Mapping(_) | Value::Null => root_mapping(path, root),
            _ => Err(ConfigError::invalid_content(
                path,
                "Unable to parse the configuration file: wrong yaml content.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    fn parse(content: &str) -> Result<Mapping> {
        YamlLoader.parse(Path::new("test.yml"), content)
    }

    #[test]
    fn test_parse_nested() {
        let tree = parse(
            "database:\n  host: localhost\n  port: 3306\n  replicas:\n    - db1\n    - db2\n",
        )
        .unwrap();
        assert_eq!(
            tree,
            mapping! {
                "database" => mapping! {
                    "host" => "localhost",
                    "port" => 3306,
                    "replicas" => vec!["db1", "db2"],
                },
            }
        );
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(parse("").unwrap(), Mapping::new());
        assert_eq!(parse("# only a comment\n").unwrap(), Mapping::new());
    }

    #[test]
    fn test_wrong_content() {
        let err = parse("just a string").unwrap_err();
        assert!(err.to_string().contains("wrong yaml content"), "{}", err);
    }

    #[test]
    fn test_scan_error() {
        assert!(parse("a: [1, 2").is_err());
    }
}
