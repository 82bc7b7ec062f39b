//! Error types for configuration loading.

use std::io;
use std::path::{Path, PathBuf};
use strata_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use strata_params::ResolveError;
use strata_xml::ConvertError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything that can go wrong while building a configuration.
///
/// Variants raised while handling a file name the file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The file \"{name}\" does not exist (in: {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("Path \"{}\" was expected to be readable.", .0.display())]
    NotReadable(PathBuf),

    #[error("\"{}\" is not a readable directory", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("No loader supports the configuration file '{}'", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("The configuration file '{}' has invalid content: {message}", path.display())]
    InvalidContent { path: PathBuf, message: String },

    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot resolve the parameters of '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: ResolveError,
    },

    #[error("Cannot convert '{}': {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("The configuration definition '{definition}' rejected the values: {message}")]
    Definition { definition: String, message: String },

    #[error("Configuration cache error in '{}': {message}", path.display())]
    Cache { path: PathBuf, message: String },

    #[error("Cannot deserialize the configuration: {0}")]
    Deserialize(#[source] serde_json::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub(crate) fn invalid_content(path: &Path, message: impl Into<String>) -> Self {
        ConfigError::InvalidContent {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file this error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::NotReadable(path)
            | ConfigError::InvalidDirectory(path)
            | ConfigError::UnsupportedFormat(path)
            | ConfigError::InvalidContent { path, .. }
            | ConfigError::Io { path, .. }
            | ConfigError::Resolve { path, .. }
            | ConfigError::Xml { path, .. }
            | ConfigError::Cache { path, .. } => Some(path),
            ConfigError::NotFound { .. }
            | ConfigError::Definition { .. }
            | ConfigError::Deserialize(_) => None,
        }
    }

    /// Convert this error to diagnostics.
    ///
    /// Parameter and XML errors keep their own `S-1-*`/`S-2-*` codes; an XML
    /// parse failure yields one diagnostic per parser problem.
    pub fn to_diagnostics(&self) -> Vec<DiagnosticMessage> {
        let builder = match self {
            ConfigError::Resolve { source, .. } => return vec![source.to_diagnostic()],
            ConfigError::Xml {
                source: ConvertError::XmlParse(diagnostics),
                ..
            } => return diagnostics.clone(),
            ConfigError::Xml {
                source: ConvertError::InvalidXmlContent,
                path,
            } => DiagnosticMessageBuilder::coded_error("S-2-7")
                .problem(format!("`{}` does not start with `<`", path.display())),
            ConfigError::NotFound { name, searched } => {
                let mut builder = DiagnosticMessageBuilder::coded_error("S-3-1")
                    .problem(format!("Cannot locate `{}`", name));
                for dir in searched {
                    builder = builder.add_detail(format!("Searched {}", dir.display()));
                }
                builder.add_hint("Add the directory holding the file with `add_directory`?")
            }
            ConfigError::NotReadable(_) | ConfigError::Io { .. } => {
                DiagnosticMessageBuilder::coded_error("S-3-1")
                    .problem(self.to_string())
            }
            ConfigError::UnsupportedFormat(path) => {
                DiagnosticMessageBuilder::coded_error("S-3-2")
                    .problem(format!("No loader supports `{}`", path.display()))
                    .add_info("Supported extensions: ini, json, yaml, yml, toml, xml (optionally followed by .dist)")
            }
            ConfigError::InvalidContent { path, message } => {
                DiagnosticMessageBuilder::coded_error("S-3-3")
                    .problem(format!("`{}` has invalid content", path.display()))
                    .add_detail(message.clone())
            }
            ConfigError::InvalidDirectory(path) => {
                DiagnosticMessageBuilder::coded_error("S-3-4")
                    .problem(format!("`{}` is not a readable directory", path.display()))
            }
            ConfigError::Definition { definition, message } => {
                DiagnosticMessageBuilder::coded_error("S-3-5")
                    .problem(format!("Definition `{}` rejected the configuration", definition))
                    .add_detail(message.clone())
            }
            ConfigError::Deserialize(err) => {
                DiagnosticMessageBuilder::coded_error("S-3-5")
                    .problem("The configuration does not match the requested type")
                    .add_detail(err.to_string())
            }
            ConfigError::Cache { path, message } => DiagnosticMessageBuilder::coded_error("S-3-6")
                .problem(format!("Cannot use the cache in `{}`", path.display()))
                .add_detail(message.clone()),
        };
        vec![builder.build()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_readable_message() {
        let err = ConfigError::NotReadable(PathBuf::from("/etc/app.yml"));
        assert_eq!(
            err.to_string(),
            "Path \"/etc/app.yml\" was expected to be readable."
        );
    }

    #[test]
    fn test_not_found_diagnostic() {
        let err = ConfigError::NotFound {
            name: "app.yml".to_string(),
            searched: vec![PathBuf::from("/etc/app"), PathBuf::from("/opt/app")],
        };
        assert_eq!(
            err.to_string(),
            "The file \"app.yml\" does not exist (in: /etc/app, /opt/app)"
        );
        insta::assert_snapshot!(err.to_diagnostics()[0].to_text(), @r"
        Error [S-3-1]: Configuration File Not Found
        Cannot locate `app.yml`
        ✖ Searched /etc/app
        ✖ Searched /opt/app
        ? Add the directory holding the file with `add_directory`?
        ");
    }

    #[test]
    fn test_xml_errors_keep_parser_diagnostics() {
        let source = strata_xml::XmlConverter::new()
            .convert("<a><b></c></d>")
            .unwrap_err();
        let err = ConfigError::Xml {
            path: PathBuf::from("app.xml"),
            source,
        };
        let codes: Vec<_> = err
            .to_diagnostics()
            .into_iter()
            .filter_map(|d| d.code)
            .collect();
        assert_eq!(codes, ["S-2-3", "S-2-3"]);
        assert_eq!(err.path(), Some(Path::new("app.xml")));
    }
}
