//! Fixtures shared by unit tests.

use crate::ops::{FsGlobber, GlobalOps, Globber, Options};
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::fs;
use tempfile::TempDir;

/// Source tree written to a temporary directory, with a fresh aggregate
/// reading from it.
pub struct Tree {
    /// Keeps the directory alive.
    pub tmp: TempDir,
    /// Aggregate rooted at `tmp`.
    pub ops: GlobalOps,
}

impl Tree {
    /// Root of the tree as a UTF-8 path.
    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.tmp.path().to_path_buf()).expect("utf8 tempdir")
    }

    /// Parse `text` as if it were the description file `file` in `srcdir`.
    pub fn parse(&mut self, file: &str, srcdir: &str, text: &str) -> crate::error::Result<()> {
        self.ops.parse_str(text, file, srcdir, None)
    }

    /// Parse and finalize, panicking on any error.
    pub fn build(&mut self, text: &str) {
        self.parse("src/Builddesc", "src", text).expect("parse");
        self.ops.run_finalizers().expect("finalize");
    }
}

/// Write `files` below a new temporary directory.
pub fn tree(files: &[(&str, &str)]) -> Tree {
    tree_with(Options::default(), files)
}

/// Like [`tree`], with invocation options.
pub fn tree_with(options: Options, files: &[(&str, &str)]) -> Tree {
    let tmp = TempDir::new().expect("tempdir");
    for (name, contents) in files {
        let path = tmp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, contents).expect("write");
    }
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 tempdir");
    let dir = Dir::open_ambient_dir(&root, ambient_authority()).expect("open tempdir");
    let ops = GlobalOps::new(options, dir, Box::new(FsGlobber::new(root)), Some("build"));
    Tree { tmp, ops }
}

/// Aggregate over an empty directory that globs through `globber`.
pub fn with_globber(globber: Box<dyn Globber>) -> Tree {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 tempdir");
    let dir = Dir::open_ambient_dir(&root, ambient_authority()).expect("open tempdir");
    let ops = GlobalOps::new(Options::default(), dir, globber, Some("build"));
    Tree { tmp, ops }
}
