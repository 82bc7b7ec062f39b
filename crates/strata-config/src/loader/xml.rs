//! XML files.

use super::{Loader, has_extension};
use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_value::Mapping;
use strata_xml::{ConvertOptions, FsIncludeResolver, XmlConverter};

/// Loads XML through [`XmlConverter`]. Relative `xi:include` references are
/// resolved against the directory of the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlLoader {
    options: ConvertOptions,
}

impl XmlLoader {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }
}

impl Loader for XmlLoader {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["xml"])
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Mapping> {
        let base = path.parent().unwrap_or(Path::new("."));
        let origin = path.to_string_lossy();
        XmlConverter::new()
            .with_options(self.options)
            .with_resolver(FsIncludeResolver::new(base))
            .convert_document(content, Some(&*origin))
            .map_err(|source| ConfigError::Xml {
                path: path.to_path_buf(),
                source,
            })
    }
}
