//! Description trees written to scratch directories.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A source tree below `src/` and a rule runtime below `tools/`, both in
/// one temporary directory.
#[derive(Debug)]
pub struct DescTree {
    tmp: TempDir,
    root: Utf8PathBuf,
}

impl DescTree {
    /// Write `files` below the source tree and an empty rule runtime.
    pub fn new(files: &[(&str, &str)]) -> Result<Self> {
        let tmp = TempDir::new().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(tmp.path().canonicalize().context("canonicalise temp dir")?)
            .map_err(|p| anyhow::anyhow!("non UTF-8 temp dir {}", p.display()))?;
        let tree = Self { tmp, root };
        tree.write_tool("rules/rules.ninja", "")?;
        tree.write_tool("rules/defaults.ninja", "")?;
        for (name, contents) in files {
            tree.write(name, contents)?;
        }
        Ok(tree)
    }

    fn write_below(base: &Utf8Path, name: &str, contents: &str) -> Result<()> {
        let path = base.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {path}"))
    }

    /// Write a file below the source tree.
    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        Self::write_below(&self.topdir(), name, contents)
    }

    /// Write a file below the rule runtime.
    pub fn write_tool(&self, name: &str, contents: &str) -> Result<()> {
        Self::write_below(&self.buildtooldir(), name, contents)
    }

    /// Read a file below the source tree.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.topdir().join(name);
        fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }

    /// Whether a file exists below the source tree.
    pub fn exists(&self, name: &str) -> bool {
        self.topdir().join(name).exists()
    }

    /// Top directory of the source tree.
    pub fn topdir(&self) -> Utf8PathBuf {
        self.root.join("src")
    }

    /// Directory holding the rule runtime.
    pub fn buildtooldir(&self) -> Utf8PathBuf {
        self.root.join("tools")
    }

    /// The scratch directory itself.
    pub fn scratch(&self) -> &TempDir {
        &self.tmp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_has_rule_runtime_and_sources() -> Result<()> {
        let tree = DescTree::new(&[("Builddesc", "CONFIG()\n"), ("lib/Builddesc", "")])?;
        assert!(tree.buildtooldir().join("rules/rules.ninja").is_file());
        assert_eq!(tree.read("Builddesc")?, "CONFIG()\n");
        assert!(tree.exists("lib/Builddesc"));
        assert!(tree.scratch().path().join("src").is_dir());
        Ok(())
    }
}
