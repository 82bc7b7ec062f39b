//! Layered configuration for strata.
//!
//! [`ConfigurationBuilder`] ties the other strata crates together: it locates
//! configuration files ([`FileLocator`]), reads them with the loader for their
//! format ([`LoaderRegistry`]: INI, JSON, TOML, XML and YAML), resolves the
//! `%parameter%` and `%env.NAME%` placeholders of each file, merges the
//! results and hands them to a [`Definition`]. The outcome can be cached on
//! disk ([`ConfigCache`]).
//!
//! # Example
//!
//! ```rust
//! use strata_config::ConfigurationBuilder;
//! use strata_value::{mapping, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(
//!     dir.path().join("app.yml"),
//!     "paths:\n  root: /srv/app\n  logs: '%root%/logs'\n",
//! )
//! .unwrap();
//!
//! let config = ConfigurationBuilder::new()
//!     .add_file("app.yml")
//!     .add_directory(dir.path())
//!     .unwrap()
//!     .set_after_params(mapping! { "debug" => false })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config["paths"]["logs"], Value::from("/srv/app/logs"));
//! assert_eq!(config["debug"], Value::Bool(false));
//! ```

pub mod builder;
pub mod cache;
pub mod definition;
pub mod error;
pub mod loader;
pub mod locator;

pub use builder::ConfigurationBuilder;
pub use cache::{CACHE_FILE, ConfigCache, FINGERPRINT_FILE, compute_fingerprint};
pub use definition::{Definition, MergeDefinition, RequiredKeysDefinition};
pub use error::{ConfigError, Result};
pub use loader::{
    IniLoader, JsonLoader, Loader, LoaderRegistry, TomlLoader, XmlLoader, YamlLoader,
};
pub use locator::FileLocator;
