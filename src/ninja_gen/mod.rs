//! Ninja file generator.
//!
//! This module renders a finalized [`GlobalOps`] into the set of Ninja files
//! making up one build: the top `build.ninja`, one `build.ninja` and one
//! `buildvars.ninja` per active flavor, and one file per descriptor object
//! directory. Rendering is pure: the caller decides where and how the
//! returned [`OutputFile`]s are written. Every collection is emitted in a
//! stable order so the output can be snapshot tested.

mod descriptor;
mod flavor;
mod top;

pub use descriptor::{DescriptorFile, Edge};

use crate::ops::GlobalOps;
use crate::paths;
use camino::Utf8Path;
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Facts about the current invocation echoed into the top file.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Command line that produced the files, without passthrough arguments.
    pub args: &'a str,
    /// Directory holding the default rule files and helper scripts.
    pub buildtooldir: &'a str,
}

/// A rendered file and how it should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the top directory, or absolute.
    pub path: String,
    /// Full file text.
    pub contents: String,
    /// Leave an identical existing file untouched so its timestamp is kept.
    pub only_if_changed: bool,
}

/// Everything a run writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Directories to create before writing, parents first.
    pub dirs: Vec<String>,
    /// Files to write; the top `build.ninja` is last.
    pub files: Vec<OutputFile>,
}

impl Output {
    fn push_dir(&mut self, dir: String) {
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    fn push_file(&mut self, path: String, contents: impl Display, only_if_changed: bool) {
        self.files.push(OutputFile {
            path,
            contents: contents.to_string(),
            only_if_changed,
        });
    }

    /// Find a rendered file by path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&OutputFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Shared state while rendering.
struct Renderer<'a> {
    ops: &'a GlobalOps,
    inv: Invocation<'a>,
}

impl Renderer<'_> {
    /// Whether a conventional rule file exists.
    ///
    /// A leading `$buildtooldir` is expanded before probing; relative
    /// paths are probed below the top directory.
    fn rule_file_exists(&self, path: &str) -> bool {
        let expanded = path.strip_prefix("$buildtooldir").map_or_else(
            || path.to_owned(),
            |rest| format!("{}{rest}", self.inv.buildtooldir),
        );
        let found = if Utf8Path::new(&expanded).is_absolute() {
            Utf8Path::new(&expanded).exists()
        } else {
            self.ops.exists(&expanded)
        };
        debug!(path = %expanded, found, "probed rule file");
        found
    }

    /// `<dir>/<name>.ninja` when `dir` is configured and the file exists.
    fn rule_file(&self, dir: &str, name: &str) -> Option<String> {
        if dir.is_empty() {
            return None;
        }
        let path = format!("{dir}/{name}.ninja");
        self.rule_file_exists(&path).then_some(path)
    }
}

/// Render every Ninja file for a finalized build.
#[must_use]
pub fn generate(ops: &GlobalOps, inv: Invocation<'_>) -> Output {
    let renderer = Renderer { ops, inv };
    let toppath = ops.config.buildpath.as_str();
    let mut out = Output::default();
    out.push_dir(toppath.to_owned());
    if !ops.config.godeps.is_empty() {
        out.push_dir(paths::join([toppath, "obj/_go"]));
    }
    for flavor in &ops.config.active_flavors {
        flavor::render(&renderer, flavor, &mut out);
    }
    let top_file = top::TopFile::new(&renderer);
    out.push_file(paths::join([toppath, "build.ninja"]), top_file, false);
    out
}

/// Write `values` space-separated, each preceded by a space.
fn write_list(f: &mut Formatter<'_>, values: &[String]) -> fmt::Result {
    for value in values {
        write!(f, " {value}")?;
    }
    Ok(())
}
