//! The configuration tree exchanged between strata components.
//!
//! Every loader produces a [`Mapping`] of [`Key`]s to [`Value`]s, whatever the
//! source format was. The parameter resolver rewrites such a tree, the XML
//! converter builds one, and the configuration builder merges several of them.
//!
//! ```rust
//! use strata_value::{mapping, Value};
//!
//! let config = mapping! {
//!     "database" => mapping! { "host" => "localhost", "port" => 5432 },
//!     "debug" => true,
//! };
//!
//! let port = config.get("database").and_then(|db| db.get("port"));
//! assert_eq!(port, Some(&Value::Int(5432)));
//! ```

mod coerce;
mod convert;
mod merge;
mod serde_impl;
mod value;

pub use coerce::{coerce_scalar, format_float, is_numeric, looks_like_integer};
pub use convert::{from_toml, from_yaml};
pub use merge::{merge_recursive, merge_replace};
pub use value::{Key, Mapping, Value};

/// Build a [`Mapping`] from `key => value` pairs.
///
/// Keys go through [`Key::from`], values through [`Value::from`].
#[macro_export]
macro_rules! mapping {
    () => {
        $crate::Mapping::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Mapping::new();
        $(
            map.insert($crate::Key::from($key), $crate::Value::from($value));
        )+
        map
    }};
}
