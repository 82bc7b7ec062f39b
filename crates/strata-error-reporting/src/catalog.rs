//! Error code catalog and lookup.
//!
//! Maps error codes (like "S-1-1") to their metadata: subsystem, title and
//! default message.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "params", "xml", "config")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message template
    pub message_template: String,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time and parsed on first use.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON - this is a bug in strata")
});

/// Look up error code information.
///
/// # Example
///
/// ```
/// use strata_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("S-1-3").unwrap();
/// assert_eq!(info.title, "Circular Reference");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_subsystems() {
        assert_eq!(get_subsystem("S-0-1"), Some("internal"));
        assert_eq!(get_subsystem("S-1-1"), Some("params"));
        assert_eq!(get_subsystem("S-2-1"), Some("xml"));
        assert_eq!(get_subsystem("S-3-1"), Some("config"));
    }

    #[test]
    fn test_nonexistent_code() {
        assert!(get_error_info("S-999-999").is_none());
    }

    #[test]
    fn test_codes_match_subsystem_prefix() {
        for (code, info) in ERROR_CATALOG.iter() {
            let prefix = match info.subsystem.as_str() {
                "internal" => "S-0-",
                "params" => "S-1-",
                "xml" => "S-2-",
                "config" => "S-3-",
                other => panic!("unknown subsystem {other} for {code}"),
            };
            assert!(code.starts_with(prefix), "{code} is not in {prefix}*");
        }
    }
}
