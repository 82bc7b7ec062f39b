//! Parameter resolution for strata configuration trees.
//!
//! String keys and values may reference other parts of the configuration:
//!
//! - `%name%` is replaced by the value of the first key `name` found anywhere
//!   in the tree (depth-first). When a string is exactly one placeholder, the
//!   referenced value keeps its type (booleans stay booleans, mappings stay
//!   mappings); inside a longer string the value must be a string or number.
//! - `%env.NAME%` is replaced by the environment variable `NAME`.
//! - `%%` is a literal percent sign.
//!
//! ```rust
//! use strata_params::{MapEnvironment, ParameterResolver};
//! use strata_value::{mapping, Value};
//!
//! let mut resolver = ParameterResolver::with_environment(
//!     mapping! { "host" => "foo.bar", "port" => 1337, "dsn" => "%host%:%port% (100%%)" },
//!     MapEnvironment::new(),
//! );
//! let resolved = resolver.resolve().unwrap();
//! assert_eq!(resolved["dsn"], Value::from("foo.bar:1337 (100%)"));
//! ```
//!
//! A [`ParameterResolver`] must not be shared between threads that resolve
//! concurrently; each independent resolution needs its own instance.

mod environment;
mod error;
mod resolver;

pub use environment::{Environment, MapEnvironment, ProcessEnvironment};
pub use error::{ResolveError, ResolveErrorKind, Result};
pub use resolver::{ParameterResolver, resolve_params};
