//! Placeholder resolution over a configuration tree.

use crate::environment::{Environment, ProcessEnvironment};
use crate::error::{ResolveError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use strata_value::{Key, Mapping, Value};

/// `%token%`, where the token holds no `%` and no whitespace. An empty token
/// (`%%`) is an escaped percent sign.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%([^%[:space:]]*)%").expect("placeholder pattern is valid")
});

const ENV_PREFIX: &str = "env.";

/// Resolves `%name%` and `%env.NAME%` placeholders in a configuration tree.
///
/// A resolver is bound to one tree and is single-use: the first successful
/// [`resolve`](Self::resolve) returns the resolved tree, every later call
/// returns an empty mapping. A failed call leaves the resolver unused.
///
/// Placeholders are looked up by key anywhere in the bound tree (depth-first,
/// first match wins), always against the unresolved original.
///
/// ```rust
/// use strata_params::{MapEnvironment, ParameterResolver};
/// use strata_value::{mapping, Value};
///
/// let env = MapEnvironment::new().with("HOME", "/home/strata");
/// let mut resolver = ParameterResolver::with_environment(
///     mapping! {
///         "project" => "demo",
///         "paths" => mapping! { "root" => "%env.HOME%/%project%" },
///         "debug" => true,
///         "verbose" => "%debug%",
///     },
///     env,
/// );
///
/// let resolved = resolver.resolve().unwrap();
/// assert_eq!(resolved["paths"]["root"], Value::from("/home/strata/demo"));
/// assert_eq!(resolved["verbose"], Value::Bool(true));
/// assert!(resolver.resolve().unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ParameterResolver<E = ProcessEnvironment> {
    config: Mapping,
    environment: E,
    resolved: bool,
}

impl ParameterResolver<ProcessEnvironment> {
    /// Bind `config`, reading `%env.*%` from the process environment.
    pub fn new(config: Mapping) -> Self {
        Self::with_environment(config, ProcessEnvironment)
    }
}

impl<E: Environment> ParameterResolver<E> {
    pub fn with_environment(config: Mapping, environment: E) -> Self {
        Self {
            config,
            environment,
            resolved: false,
        }
    }

    /// Whether a successful resolution already happened.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Resolve every key and value of the bound tree.
    ///
    /// Keys are resolved but keep their `%%` escapes; values are unescaped
    /// (`%%` becomes `%`) once all placeholders are substituted.
    pub fn resolve(&mut self) -> Result<Mapping> {
        if self.resolved {
            tracing::debug!("Parameters already resolved, returning empty mapping");
            return Ok(Mapping::new());
        }

        let mut parameters = Mapping::with_capacity(self.config.len());
        for (key, value) in &self.config {
            let key = self.resolve_key(key, &[])?;
            let value = self.resolve_value(value, &[])?;
            parameters.insert(key, unescape(value));
        }

        self.resolved = true;
        Ok(parameters)
    }

    fn resolve_value(&self, value: &Value, resolving: &[String]) -> Result<Value> {
        match value {
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(self.resolve_key(k, resolving)?, self.resolve_value(v, resolving)?);
                }
                Ok(Value::Mapping(out))
            }
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.resolve_value(item, resolving))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::String(s) => self.resolve_string(s, resolving),
            other => Ok(other.clone()),
        }
    }

    fn resolve_key(&self, key: &Key, resolving: &[String]) -> Result<Key> {
        let Key::Str(s) = key else {
            return Ok(key.clone());
        };

        match self.resolve_string(s, resolving)? {
            Value::String(resolved) => Ok(Key::from(resolved)),
            Value::Int(i) => Ok(Key::Int(i)),
            other => Err(ResolveError::InvalidSubstitution {
                name: s.clone(),
                found: other.type_name(),
            }),
        }
    }

    /// Substitute the placeholders of `s`.
    ///
    /// When `s` is exactly one placeholder the referenced value is returned
    /// with its own type; otherwise the result is a string.
    fn resolve_string(&self, s: &str, resolving: &[String]) -> Result<Value> {
        let mut only_key = None;
        let mut out = String::with_capacity(s.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(s) {
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let token = token.as_str();
            out.push_str(&s[last..whole.start()]);
            last = whole.end();

            if token.is_empty() {
                out.push_str("%%");
                continue;
            }

            if let Some(name) = token.strip_prefix(ENV_PREFIX) {
                out.push_str(&self.env_param(name)?);
                continue;
            }

            if resolving.iter().any(|r| r == token) {
                return Err(ResolveError::CircularReference {
                    name: token.to_string(),
                    chain: resolving.to_vec(),
                });
            }

            if whole.as_str() == s {
                only_key = Some(token);
                continue;
            }

            let found = self.lookup(token)?;
            let text = substitution_text(token, found)?;
            let nested = self.resolve_string(&text, &extend(resolving, token))?;
            out.push_str(&substitution_text(token, &nested)?);
            tracing::debug!(parameter = token, "Substituted placeholder");
        }

        let Some(key) = only_key else {
            out.push_str(&s[last..]);
            return Ok(Value::String(out));
        };

        tracing::debug!(parameter = key, "Replacing value with referenced parameter");
        self.resolve_value(self.lookup(key)?, &extend(resolving, key))
    }

    fn env_param(&self, name: &str) -> Result<String> {
        let value = self.environment.var(name).ok_or_else(|| {
            ResolveError::EnvironmentVariableNotFound {
                name: name.to_string(),
            }
        })?;
        tracing::debug!(variable = name, "Substituted environment variable");
        Ok(value)
    }

    fn lookup(&self, name: &str) -> Result<&Value> {
        find_in_mapping(&self.config, name).ok_or_else(|| ResolveError::ParameterNotFound {
            name: name.to_string(),
        })
    }
}

/// Resolve `config` once against the process environment.
pub fn resolve_params(config: &Mapping) -> Result<Mapping> {
    ParameterResolver::new(config.clone()).resolve()
}

fn extend(resolving: &[String], name: &str) -> Vec<String> {
    let mut chain = resolving.to_vec();
    chain.push(name.to_string());
    chain
}

fn substitution_text(name: &str, value: &Value) -> Result<String> {
    value
        .scalar_to_string()
        .ok_or_else(|| ResolveError::InvalidSubstitution {
            name: name.to_string(),
            found: value.type_name(),
        })
}

/// Depth-first, pre-order search for the first string key equal to `name`.
fn find_in_mapping<'a>(map: &'a Mapping, name: &str) -> Option<&'a Value> {
    map.iter().find_map(|(key, value)| {
        if key.as_str() == Some(name) {
            Some(value)
        } else {
            find_in_value(value, name)
        }
    })
}

fn find_in_value<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Mapping(map) => find_in_mapping(map, name),
        Value::Sequence(items) => items.iter().find_map(|item| find_in_value(item, name)),
        _ => None,
    }
}

fn unescape(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace("%%", "%")),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(unescape).collect()),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| (key, unescape(value)))
                .collect(),
        ),
        other => other,
    }
}
