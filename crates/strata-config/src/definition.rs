//! Hooks that turn the loaded layers into the final configuration.

use crate::error::{ConfigError, Result};
use strata_value::{Mapping, merge_replace};

/// Combines `[before, loaded, after]` into the final configuration.
///
/// Implement this to validate the configuration, fill in defaults or
/// normalise it. Errors should be reported as [`ConfigError::Definition`].
pub trait Definition {
    /// A stable name for this definition.
    ///
    /// It takes part in the cache fingerprint, so change it when the
    /// definition's behaviour changes.
    fn id(&self) -> &str;

    /// Process the layers: the before-parameters, the merged file contents and
    /// the after-parameters, in that order.
    fn process(&self, layers: Vec<Mapping>) -> Result<Mapping>;
}

/// Recursive replace-merge of the layers; later layers win.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeDefinition;

impl Definition for MergeDefinition {
    fn id(&self) -> &str {
        "merge"
    }

    fn process(&self, layers: Vec<Mapping>) -> Result<Mapping> {
        Ok(merge_replace(layers))
    }
}

/// Requires the listed top-level keys, then merges like [`MergeDefinition`].
#[derive(Debug, Clone, Default)]
pub struct RequiredKeysDefinition {
    keys: Vec<String>,
}

impl RequiredKeysDefinition {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Definition for RequiredKeysDefinition {
    fn id(&self) -> &str {
        "required-keys"
    }

    fn process(&self, layers: Vec<Mapping>) -> Result<Mapping> {
        let merged = merge_replace(layers);
        let missing: Vec<&str> = self
            .keys
            .iter()
            .map(String::as_str)
            .filter(|key| !merged.contains_key(*key))
            .collect();

        if missing.is_empty() {
            Ok(merged)
        } else {
            Err(ConfigError::Definition {
                definition: self.id().to_string(),
                message: format!("missing required keys: {}", missing.join(", ")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    #[test]
    fn test_merge_definition_later_wins() {
        let merged = MergeDefinition
            .process(vec![
                mapping! { "debug" => true, "db" => mapping! { "host" => "a", "port" => 1 } },
                mapping! { "db" => mapping! { "host" => "b" } },
                mapping! { "debug" => false },
            ])
            .unwrap();
        assert_eq!(
            merged,
            mapping! { "debug" => false, "db" => mapping! { "host" => "b", "port" => 1 } }
        );
    }

    #[test]
    fn test_required_keys() {
        let definition = RequiredKeysDefinition::new(["database", "cache"]);
        let err = definition
            .process(vec![mapping! { "database" => "x" }])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The configuration definition 'required-keys' rejected the values: missing required keys: cache"
        );
        assert!(
            definition
                .process(vec![mapping! { "database" => 1 }, mapping! { "cache" => 2 }])
                .is_ok()
        );
    }
}
