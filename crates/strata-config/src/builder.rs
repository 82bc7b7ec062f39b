//! The configuration builder.

use crate::cache::{ConfigCache, compute_fingerprint};
use crate::definition::{Definition, MergeDefinition};
use crate::error::{ConfigError, Result};
use crate::loader::LoaderRegistry;
use crate::locator::FileLocator;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_params::{Environment, ProcessEnvironment};
use strata_value::{Mapping, Value, merge_recursive};
use strata_xml::ConvertOptions;
use tracing::{debug, info};

/// Version of the cache layout, part of every fingerprint.
const CACHE_VERSION: u32 = 1;

/// Builds a configuration from files, parameters and a [`Definition`].
///
/// Files are located through the configured directories, loaded by the
/// loader matching their extension (placeholders resolved per file), merged
/// recursively in the order they were added, then passed to the definition
/// together with the before- and after-parameters.
///
/// ```rust,no_run
/// use strata_config::ConfigurationBuilder;
///
/// # fn main() -> strata_config::Result<()> {
/// let config = ConfigurationBuilder::new()
///     .add_file("app.yml")
///     .add_file("app.local.yml")
///     .add_directory("/etc/app")?
///     .set_cache_directory("/var/cache/app")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigurationBuilder {
    files: Vec<String>,
    directories: Vec<PathBuf>,
    definition: Arc<dyn Definition>,
    before_params: Mapping,
    after_params: Mapping,
    cache_directory: Option<PathBuf>,
    keep_first_xml_tag: bool,
    environment: Box<dyn Environment>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            directories: Vec::new(),
            definition: Arc::new(MergeDefinition),
            before_params: Mapping::new(),
            after_params: Mapping::new(),
            cache_directory: None,
            keep_first_xml_tag: false,
            environment: Box::new(ProcessEnvironment),
        }
    }

    /// Add a file, by name (looked up in the directories) or by path.
    pub fn add_file(mut self, file: impl AsRef<Path>) -> Self {
        self.files
            .push(file.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Replace the files.
    pub fn set_files(mut self, files: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        self.files.clear();
        files.into_iter().fold(self, Self::add_file)
    }

    /// Add a directory to look files up in.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDirectory`] when `dir` is not a readable directory.
    pub fn add_directory(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        self.directories.push(readable_directory(dir.as_ref())?);
        Ok(self)
    }

    /// Replace the directories.
    pub fn set_directories(
        mut self,
        dirs: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<Self> {
        self.directories.clear();
        dirs.into_iter().try_fold(self, Self::add_directory)
    }

    pub fn set_definition(mut self, definition: Arc<dyn Definition>) -> Self {
        self.definition = definition;
        self
    }

    /// Parameters placed before the loaded files; files override them.
    pub fn set_before_params(mut self, params: Mapping) -> Self {
        self.before_params = params;
        self
    }

    /// Parameters placed after the loaded files; they override the files.
    pub fn set_after_params(mut self, params: Mapping) -> Self {
        self.after_params = params;
        self
    }

    /// Cache the built configuration in `dir`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDirectory`] when `dir` is not a readable directory.
    pub fn set_cache_directory(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        self.cache_directory = Some(readable_directory(dir.as_ref())?);
        Ok(self)
    }

    /// Keep the root element of XML files as a top-level key.
    pub fn keep_first_xml_tag(mut self) -> Self {
        self.keep_first_xml_tag = true;
        self
    }

    /// Take `%env.*%` values from `environment` instead of the process.
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    /// Build the configuration, from the cache when it is fresh.
    pub fn build(&self) -> Result<Mapping> {
        match &self.cache_directory {
            Some(dir) => self.build_cached(dir),
            None => self.load_configuration(),
        }
    }

    /// Build the configuration and deserialize it into `T`.
    pub fn build_into<T: DeserializeOwned>(&self) -> Result<T> {
        let config = self.build()?;
        serde_json::from_value(Value::Mapping(config).to_json()).map_err(ConfigError::Deserialize)
    }

    /// Load, merge and process the files, bypassing the cache.
    pub fn load_configuration(&self) -> Result<Mapping> {
        let loaded = self.load_parameters()?;
        self.definition.process(vec![
            self.before_params.clone(),
            loaded,
            self.after_params.clone(),
        ])
    }

    fn locator(&self) -> FileLocator {
        FileLocator::new(self.directories.iter().cloned())
    }

    fn load_parameters(&self) -> Result<Mapping> {
        let locator = self.locator();
        let registry = LoaderRegistry::with_xml_options(ConvertOptions {
            preserve_first_tag: self.keep_first_xml_tag,
        });

        let layers = self
            .files
            .iter()
            .map(|file| {
                let path = locator.locate(file, None)?;
                registry.load(&path, self.environment.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;

        info!(files = layers.len(), "Loaded configuration files");
        Ok(merge_recursive(layers))
    }

    fn build_cached(&self, dir: &Path) -> Result<Mapping> {
        let cache = ConfigCache::new(dir, self.fingerprint());
        let locator = self.locator();
        let sources: Option<Vec<PathBuf>> = self
            .files
            .iter()
            .map(|file| locator.locate(file, None).ok())
            .collect();

        if let Some(sources) = &sources {
            if cache.is_fresh(sources) {
                debug!(cache = %dir.display(), "Using cached configuration");
                return cache.read();
            }
        }

        let config = self.load_configuration()?;
        cache.write(&config)?;
        Ok(config)
    }

    /// Digest of everything that determines the built configuration.
    pub fn fingerprint(&self) -> String {
        let setup = serde_json::json!({
            "version": CACHE_VERSION,
            "files": self.files,
            "directories": self
                .directories
                .iter()
                .map(|d| d.to_string_lossy())
                .collect::<Vec<_>>(),
            "definition": self.definition.id(),
            "before": Value::Mapping(self.before_params.clone()).to_json(),
            "after": Value::Mapping(self.after_params.clone()).to_json(),
            "keep_first_xml_tag": self.keep_first_xml_tag,
        });
        compute_fingerprint(setup.to_string().as_bytes())
    }
}

fn readable_directory(dir: &Path) -> Result<PathBuf> {
    if dir.is_dir() && dir.read_dir().is_ok() {
        Ok(dir.to_path_buf())
    } else {
        Err(ConfigError::InvalidDirectory(dir.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    #[test]
    fn test_invalid_directory() {
        let err = ConfigurationBuilder::new()
            .add_directory("/definitely/not/here")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidDirectory(_)));
    }

    #[test]
    fn test_fingerprint_follows_setup() {
        let base = ConfigurationBuilder::new().add_file("a.yml");
        let same = ConfigurationBuilder::new().add_file("a.yml");
        let other = ConfigurationBuilder::new()
            .add_file("a.yml")
            .set_after_params(mapping! { "debug" => true });

        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), other.fingerprint());
        assert_ne!(
            base.fingerprint(),
            ConfigurationBuilder::new()
                .add_file("a.yml")
                .keep_first_xml_tag()
                .fingerprint()
        );
    }

    #[test]
    fn test_set_files_replaces() {
        let builder = ConfigurationBuilder::new()
            .add_file("a.yml")
            .set_files(["b.yml", "c.yml"]);
        assert_eq!(builder.files, ["b.yml", "c.yml"]);
    }

    #[test]
    fn test_params_without_files() {
        let config = ConfigurationBuilder::new()
            .set_before_params(mapping! { "debug" => true, "name" => "app" })
            .set_after_params(mapping! { "debug" => false })
            .build()
            .unwrap();
        assert_eq!(config, mapping! { "debug" => false, "name" => "app" });
    }
}
