//! Access to environment variables for `%env.NAME%` placeholders.
//!
//! The resolver never reads the process environment directly; it goes through
//! an [`Environment`] so that tests (and embedders) can supply their own.

use std::collections::HashMap;

/// Source of environment variables.
pub trait Environment {
    /// Value of the variable `name`, or `None` when it is unset.
    ///
    /// A variable set to the empty string is `Some("")`, not `None`.
    fn var(&self, name: &str) -> Option<String>;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        // Names the OS cannot hold are never set.
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }
}

/// An in-memory environment.
///
/// ```rust
/// use strata_params::{Environment, MapEnvironment};
///
/// let env = MapEnvironment::new().with("HOME", "/home/strata");
/// assert_eq!(env.var("HOME").as_deref(), Some("/home/strata"));
/// assert_eq!(env.var("USER"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, returning the environment for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
