//! On-disk cache of built configurations.
//!
//! The cache directory holds two files:
//!
//! - `strata_config.cache.json`: the configuration as JSON;
//! - `strata_config.fingerprint`: a SHA-256 digest of the builder setup that
//!   produced it.
//!
//! A cache is fresh when the fingerprint matches and no source file was
//! modified after the cache file was written.
//!
//! JSON has no infinity or NaN, so a configuration holding such a float is
//! not cached.

use crate::error::{ConfigError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use strata_value::{Mapping, Value};
use tracing::{debug, info, warn};

pub const CACHE_FILE: &str = "strata_config.cache.json";
pub const FINGERPRINT_FILE: &str = "strata_config.fingerprint";

/// Compute the SHA-256 hex digest of `content`.
pub fn compute_fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// A configuration cache in one directory.
#[derive(Debug, Clone)]
pub struct ConfigCache {
    directory: PathBuf,
    fingerprint: String,
}

impl ConfigCache {
    /// A cache in `directory` for the builder setup digested in `fingerprint`.
    pub fn new(directory: impl Into<PathBuf>, fingerprint: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.directory.join(CACHE_FILE)
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.directory.join(FINGERPRINT_FILE)
    }

    /// Whether the cached configuration can be used for `sources`.
    pub fn is_fresh(&self, sources: &[PathBuf]) -> bool {
        match fs::read_to_string(self.fingerprint_path()) {
            Ok(stored) if stored == self.fingerprint => {}
            _ => {
                debug!(cache = %self.directory.display(), "Cache fingerprint missing or changed");
                return false;
            }
        }

        let Some(written) = modified(&self.cache_path()) else {
            return false;
        };

        sources.iter().all(|source| match modified(source) {
            Some(changed) if changed <= written => true,
            _ => {
                debug!(source = %source.display(), "Configuration source changed since caching");
                false
            }
        })
    }

    /// Read the cached configuration.
    pub fn read(&self) -> Result<Mapping> {
        let path = self.cache_path();
        let content = fs::read_to_string(&path).map_err(|e| self.error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| self.error(e.to_string()))
    }

    /// Store `config` and the fingerprint.
    ///
    /// A configuration JSON cannot represent is not stored, and any previous
    /// cache in the directory stops being fresh.
    pub fn write(&self, config: &Mapping) -> Result<()> {
        if config.values().any(has_non_finite) {
            warn!(
                cache = %self.directory.display(),
                "Configuration holds a non-finite float, not caching it"
            );
            return match fs::remove_file(self.fingerprint_path()) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => {
                    Err(self.error(e.to_string()))
                }
                _ => Ok(()),
            };
        }

        let content =
            serde_json::to_string_pretty(config).map_err(|e| self.error(e.to_string()))?;
        fs::write(self.cache_path(), content).map_err(|e| self.error(e.to_string()))?;
        fs::write(self.fingerprint_path(), &self.fingerprint)
            .map_err(|e| self.error(e.to_string()))?;
        info!(cache = %self.directory.display(), "Wrote configuration cache");
        Ok(())
    }

    fn error(&self, message: String) -> ConfigError {
        ConfigError::Cache {
            path: self.directory.clone(),
            message,
        }
    }
}

fn has_non_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => !f.is_finite(),
        Value::Sequence(items) => items.iter().any(has_non_finite),
        Value::Mapping(map) => map.values().any(has_non_finite),
        _ => false,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use strata_value::mapping;

    #[test]
    fn test_compute_fingerprint() {
        assert_eq!(
            compute_fingerprint(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigCache::new(dir.path(), "abc");
        let config = mapping! { "db" => mapping! { "port" => 3306, "ratio" => 0.5 }, 7 => "seven" };

        assert!(!cache.is_fresh(&[]));
        cache.write(&config).unwrap();
        assert!(cache.is_fresh(&[]));
        assert_eq!(cache.read().unwrap(), config);
    }

    #[test]
    fn test_other_fingerprint_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        ConfigCache::new(dir.path(), "one").write(&Mapping::new()).unwrap();
        assert!(!ConfigCache::new(dir.path(), "two").is_fresh(&[]));
    }

    #[test]
    fn test_newer_source_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app.yml");
        fs::write(&source, "a: 1").unwrap();

        let cache = ConfigCache::new(dir.path(), "abc");
        cache.write(&Mapping::new()).unwrap();

        let file = fs::File::options().write(true).open(&source).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        assert!(!cache.is_fresh(std::slice::from_ref(&source)));
    }

    #[test]
    fn test_missing_source_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigCache::new(dir.path(), "abc");
        cache.write(&Mapping::new()).unwrap();
        assert!(!cache.is_fresh(&[dir.path().join("gone.yml")]));
    }

    #[test]
    fn test_non_finite_floats_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigCache::new(dir.path(), "abc");
        cache.write(&mapping! { "ok" => 1 }).unwrap();
        assert!(cache.is_fresh(&[]));

        let config = mapping! { "limits" => mapping! { "max" => vec![Value::Float(f64::INFINITY)] } };
        cache.write(&config).unwrap();
        assert!(!cache.is_fresh(&[]));
        assert!(!cache.fingerprint_path().exists());

        cache.write(&mapping! { "nan" => f64::NAN }).unwrap();
        assert!(!cache.is_fresh(&[]));
    }
}
