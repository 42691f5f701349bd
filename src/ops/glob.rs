//! Source pattern expansion.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, glob_with};

/// Expands a source pattern into matching paths.
#[cfg_attr(test, mockall::automock)]
pub trait Globber {
    /// Return the paths matching `pattern`, sorted.
    ///
    /// Paths are relative to the same base as `pattern`.
    ///
    /// # Errors
    ///
    /// Fails when `pattern` is not a valid glob.
    fn glob(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Globs against the filesystem below a root directory.
#[derive(Debug, Clone)]
pub struct FsGlobber {
    root: Utf8PathBuf,
}

impl FsGlobber {
    /// Glob relative to `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Globber for FsGlobber {
    fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let opts = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let full = if self.root.as_str() == "." || pattern.starts_with('/') {
            Utf8PathBuf::from(pattern)
        } else {
            self.root.join(pattern)
        };
        let entries = glob_with(full.as_str(), opts).map_err(|err| BuildError::Glob {
            pattern: pattern.to_owned(),
            message: err.to_string(),
        })?;
        let mut found = Vec::new();
        for entry in entries.flatten() {
            let Ok(path) = Utf8PathBuf::from_path_buf(entry) else {
                continue;
            };
            let relative = if pattern.starts_with('/') {
                path.as_path()
            } else {
                path.strip_prefix(&self.root).unwrap_or_else(|_| path.as_path())
            };
            found.push(relative_str(relative));
        }
        Ok(found)
    }
}

fn relative_str(path: &Utf8Path) -> String {
    path.as_str().trim_start_matches("./").to_owned()
}
