//! Error types for parameter resolution.

use strata_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use thiserror::Error;

/// Result type alias for strata-params operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// The category of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveErrorKind {
    ParameterNotFound,
    EnvironmentVariableNotFound,
    CircularReference,
    InvalidSubstitution,
}

/// Errors raised while resolving placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// `%name%` does not match any key in the configuration tree.
    #[error("Parameter '{name}' not found in configuration")]
    ParameterNotFound { name: String },

    /// `%env.NAME%` refers to an unset environment variable.
    #[error("Environment variable '{name}' is not defined")]
    EnvironmentVariableNotFound { name: String },

    /// A placeholder refers back to itself through `chain`.
    #[error("Circular reference detected for parameter '{name}'")]
    CircularReference {
        name: String,
        /// Parameters being resolved when the cycle was found, outermost first.
        chain: Vec<String>,
    },

    /// A placeholder embedded in a longer string (or used as a key) resolved
    /// to something that is neither a string nor a number.
    #[error(
        "A string value must be composed of strings and/or numbers: parameter '{name}' is a {found}"
    )]
    InvalidSubstitution { name: String, found: &'static str },
}

impl ResolveError {
    pub fn kind(&self) -> ResolveErrorKind {
        match self {
            ResolveError::ParameterNotFound { .. } => ResolveErrorKind::ParameterNotFound,
            ResolveError::EnvironmentVariableNotFound { .. } => {
                ResolveErrorKind::EnvironmentVariableNotFound
            }
            ResolveError::CircularReference { .. } => ResolveErrorKind::CircularReference,
            ResolveError::InvalidSubstitution { .. } => ResolveErrorKind::InvalidSubstitution,
        }
    }

    /// The offending placeholder token (without `%` delimiters or `env.` prefix).
    pub fn token(&self) -> &str {
        match self {
            ResolveError::ParameterNotFound { name }
            | ResolveError::EnvironmentVariableNotFound { name }
            | ResolveError::CircularReference { name, .. }
            | ResolveError::InvalidSubstitution { name, .. } => name,
        }
    }

    /// Convert this error to a DiagnosticMessage with the appropriate S-1-* error code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            ResolveError::ParameterNotFound { name } => {
                DiagnosticMessageBuilder::coded_error("S-1-1")
                    .problem(format!(
                        "Placeholder `%{}%` does not match any key in the configuration",
                        name
                    ))
                    .add_hint("Define the parameter, or write `%%` for a literal percent sign?")
                    .build()
            }

            ResolveError::EnvironmentVariableNotFound { name } => {
                DiagnosticMessageBuilder::coded_error("S-1-2")
                    .problem(format!("Environment variable `{}` is not defined", name))
                    .add_detail(format!("Referenced as `%env.{}%`", name))
                    .add_hint("Export the variable before loading the configuration?")
                    .build()
            }

            ResolveError::CircularReference { name, chain } => {
                let mut builder = DiagnosticMessageBuilder::coded_error("S-1-3")
                    .problem(format!("Circular reference detected for parameter `{}`", name));

                if !chain.is_empty() {
                    let path: Vec<String> = chain
                        .iter()
                        .chain(std::iter::once(name))
                        .map(|p| format!("%{}%", p))
                        .collect();
                    builder = builder.add_detail(format!("Resolution chain: {}", path.join(" → ")));
                }

                builder.build()
            }

            ResolveError::InvalidSubstitution { name, found } => {
                DiagnosticMessageBuilder::coded_error("S-1-4")
                    .problem("A string value must be composed of strings and/or numbers")
                    .add_detail(format!("Parameter `{}` resolves to a {}", name, found))
                    .add_hint(
                        "Use the placeholder as the whole value to keep its original type?",
                    )
                    .build()
            }
        }
    }
}
