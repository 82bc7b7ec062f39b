//! Format loaders.
//!
//! A [`Loader`] turns the text of one configuration file into a [`Mapping`]
//! and resolves its `%parameter%` placeholders. Loaders are picked by file
//! name, so `app.yml` and `app.yml.dist` both go to the YAML loader.

mod ini;
mod json;
mod toml;
mod xml;
mod yaml;

pub use ini::IniLoader;
pub use json::JsonLoader;
pub use self::toml::TomlLoader;
pub use xml::XmlLoader;
pub use yaml::YamlLoader;

use crate::error::{ConfigError, Result};
use std::path::Path;
use strata_params::{Environment, ParameterResolver, ProcessEnvironment};
use strata_value::{Key, Mapping, Value};
use strata_xml::ConvertOptions;
use tracing::debug;

/// Reads one configuration format.
pub trait Loader {
    /// Short name of the format, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this loader reads `path`, judged by its file name.
    fn supports(&self, path: &Path) -> bool;

    /// Parse the content of `path` into an unresolved tree.
    fn parse(&self, path: &Path, content: &str) -> Result<Mapping>;

    /// Read, parse and resolve `path` against the process environment.
    fn load(&self, path: &Path) -> Result<Mapping> {
        self.load_with_environment(path, &ProcessEnvironment)
    }

    /// Read, parse and resolve `path`, taking `%env.*%` values from `environment`.
    fn load_with_environment(
        &self,
        path: &Path,
        environment: &dyn Environment,
    ) -> Result<Mapping> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let parsed = self.parse(path, &content)?;
        debug!(
            loader = self.name(),
            path = %path.display(),
            keys = parsed.len(),
            "Parsed configuration file"
        );

        ParameterResolver::with_environment(parsed, environment)
            .resolve()
            .map_err(|source| ConfigError::Resolve {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Whether the file name of `path` ends with one of `extensions`, optionally
/// followed by `.dist`.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.strip_suffix(".dist").unwrap_or(name);
    extensions.iter().any(|ext| {
        name.strip_suffix(ext)
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Turn the root of a parsed document into a mapping.
///
/// An empty document gives an empty mapping and a list gives integer keys;
/// a scalar root is an error.
pub(crate) fn root_mapping(path: &Path, root: Value) -> Result<Mapping> {
    match root {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        Value::Sequence(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Key::from(i), v))
            .collect()),
        other => Err(ConfigError::invalid_content(
            path,
            format!("expected a mapping at the top level, found a {}", other.type_name()),
        )),
    }
}

/// The loaders tried for each file, in order.
///
/// The first loader that supports a file name handles the file.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn Loader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_xml_options(ConvertOptions::default())
    }
}

impl LoaderRegistry {
    /// A registry without loaders.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// The built-in loaders, with the XML loader using `options`.
    pub fn with_xml_options(options: ConvertOptions) -> Self {
        let mut registry = Self::empty();
        registry.register(IniLoader);
        registry.register(JsonLoader);
        registry.register(TomlLoader);
        registry.register(XmlLoader::new(options));
        registry.register(YamlLoader);
        registry
    }

    pub fn register(&mut self, loader: impl Loader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// The loader for `path`, if any.
    pub fn resolve(&self, path: &Path) -> Option<&dyn Loader> {
        self.loaders
            .iter()
            .find(|l| l.supports(path))
            .map(|l| l.as_ref())
    }

    /// Load `path` with the first loader that supports it.
    pub fn load(&self, path: &Path, environment: &dyn Environment) -> Result<Mapping> {
        let loader = self
            .resolve(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        loader.load_with_environment(path, environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use strata_params::MapEnvironment;
    use strata_value::mapping;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("app.yml"), &["yml", "yaml"]));
        assert!(has_extension(Path::new("conf/app.yaml.dist"), &["yml", "yaml"]));
        assert!(!has_extension(Path::new("app.xyml"), &["yml"]));
        assert!(!has_extension(Path::new("yml"), &["yml"]));
        assert!(!has_extension(Path::new("app.yml.bak"), &["yml"]));
    }

    #[test]
    fn test_registry_picks_loader_by_name() {
        let registry = LoaderRegistry::default();
        let name = |p: &str| registry.resolve(Path::new(p)).map(|l| l.name());
        assert_eq!(name("a.ini"), Some("ini"));
        assert_eq!(name("a.json.dist"), Some("json"));
        assert_eq!(name("a.toml"), Some("toml"));
        assert_eq!(name("a.xml"), Some("xml"));
        assert_eq!(name("a.yaml"), Some("yaml"));
        assert_eq!(name("a.neon"), None);
    }

    #[test]
    fn test_unsupported_format() {
        let err = LoaderRegistry::default()
            .load(Path::new("app.neon"), &MapEnvironment::new())
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::UnsupportedFormat(p) if p == PathBuf::from("app.neon"))
        );
    }

    #[test]
    fn test_load_resolves_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, r#"{"home": "%env.HOME%", "cache": "%home%/cache"}"#).unwrap();

        let env = MapEnvironment::new().with("HOME", "/home/strata");
        let tree = LoaderRegistry::default().load(&path, &env).unwrap();
        assert_eq!(
            tree,
            mapping! { "home" => "/home/strata", "cache" => "/home/strata/cache" }
        );
    }

    #[test]
    fn test_root_mapping() {
        let path = Path::new("x.json");
        assert_eq!(root_mapping(path, Value::Null).unwrap(), Mapping::new());
        assert_eq!(
            root_mapping(path, Value::from(vec!["a", "b"])).unwrap(),
            mapping! { 0 => "a", 1 => "b" }
        );
        assert!(root_mapping(path, Value::Int(3)).is_err());
    }
}
