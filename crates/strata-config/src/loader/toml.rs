//! TOML files.

use super::{Loader, has_extension};
use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_value::{Mapping, Value, from_toml};

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlLoader;

impl Loader for TomlLoader {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["toml"])
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Mapping> {
        let table: ::toml::Table = content
            .parse()
            .map_err(|e: ::toml::de::Error| ConfigError::invalid_content(path, e.message()))?;
        match from_toml(&::toml::Value::Table(table)) {
            Value::Mapping(map) => Ok(map),
            _ => Ok(Mapping::new()),
        }
    }
}
