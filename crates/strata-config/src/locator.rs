//! Locating configuration files by name.

use crate::error::{ConfigError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds configuration files in a list of directories.
///
/// Absolute names are used as they are. Relative names are looked up in the
/// current directory passed to [`locate`](Self::locate), then in each
/// configured directory in order.
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    directories: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new(directories: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            directories: directories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// The first readable match for `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] when no candidate exists,
    /// [`ConfigError::NotReadable`] when the first match cannot be opened.
    pub fn locate(&self, name: &str, current: Option<&Path>) -> Result<PathBuf> {
        let found = self.find(name, current, true)?;
        found.into_iter().next().ok_or_else(|| self.not_found(name, current))
    }

    /// Every match for `name`, in lookup order. Each one must be readable.
    pub fn locate_all(&self, name: &str, current: Option<&Path>) -> Result<Vec<PathBuf>> {
        self.find(name, current, false)
    }

    fn find(&self, name: &str, current: Option<&Path>, first: bool) -> Result<Vec<PathBuf>> {
        if name.is_empty() {
            return Err(self.not_found(name, current));
        }

        let path = Path::new(name);
        if path.is_absolute() {
            if !path.exists() {
                return Err(self.not_found(name, None));
            }
            check_readable(path)?;
            return Ok(vec![path.to_path_buf()]);
        }

        let mut found = Vec::new();
        for dir in current.into_iter().chain(self.directories.iter().map(PathBuf::as_path)) {
            let candidate = dir.join(path);
            if !candidate.exists() || found.contains(&candidate) {
                continue;
            }
            check_readable(&candidate)?;
            debug!(name, path = %candidate.display(), "Located configuration file");
            found.push(candidate);
            if first {
                break;
            }
        }

        if found.is_empty() {
            return Err(self.not_found(name, current));
        }
        Ok(found)
    }

    fn not_found(&self, name: &str, current: Option<&Path>) -> ConfigError {
        ConfigError::NotFound {
            name: name.to_string(),
            searched: current
                .map(Path::to_path_buf)
                .into_iter()
                .chain(self.directories.iter().cloned())
                .collect(),
        }
    }
}

fn check_readable(path: &Path) -> Result<()> {
    let readable = if path.is_dir() {
        path.read_dir().is_ok()
    } else {
        File::open(path).is_ok()
    };
    if readable {
        Ok(())
    } else {
        Err(ConfigError::NotReadable(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locate_in_directories_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("app.yml"), "a: 1").unwrap();
        fs::write(first.path().join("app.yml"), "a: 2").unwrap();

        let locator = FileLocator::new([first.path(), second.path()]);
        assert_eq!(
            locator.locate("app.yml", None).unwrap(),
            first.path().join("app.yml")
        );
        assert_eq!(
            locator.locate_all("app.yml", None).unwrap(),
            vec![first.path().join("app.yml"), second.path().join("app.yml")]
        );
    }

    #[test]
    fn test_current_directory_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let current = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.ini"), "").unwrap();
        fs::write(current.path().join("app.ini"), "").unwrap();

        let locator = FileLocator::new([dir.path()]);
        assert_eq!(
            locator.locate("app.ini", Some(current.path())).unwrap(),
            current.path().join("app.ini")
        );
    }

    #[test]
    fn test_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        fs::write(&file, "{}").unwrap();

        let locator = FileLocator::default();
        assert_eq!(locator.locate(file.to_str().unwrap(), None).unwrap(), file);

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            locator.locate(missing.to_str().unwrap(), None),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_not_found_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FileLocator::new([dir.path()]);
        match locator.locate("nope.yml", None) {
            Err(ConfigError::NotFound { name, searched }) => {
                assert_eq!(name, "nope.yml");
                assert_eq!(searched, vec![dir.path().to_path_buf()]);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_name() {
        assert!(FileLocator::default().locate("", None).is_err());
    }
}
