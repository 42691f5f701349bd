//! Error types for the runner module.

// miette/thiserror derive expansion trips `unused_assignments` on some
// toolchains; `#[expect]` would fail on the others.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while locating the tree or running Ninja.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// Neither `Builddesc.top` nor `Builddesc` exists above the start.
    #[error("no Builddesc found in {start} or any parent directory")]
    #[diagnostic(
        code(builddesc::runner::topdir_not_found),
        help("run from inside a source tree or pass --topdir")
    )]
    TopdirNotFound {
        /// Directory the search started from.
        start: Utf8PathBuf,
    },

    /// No candidate directory holds the rule runtime.
    #[error("can't find the directory containing the build tools")]
    #[diagnostic(
        code(builddesc::runner::buildtooldir_not_found),
        help("set BUILDTOOLDIR or pass --buildtooldir")
    )]
    BuildtooldirNotFound {
        /// Directories that were checked.
        tried: Vec<Utf8PathBuf>,
    },

    /// A path handed to the runner is not valid UTF-8.
    #[error("path {path} is not valid UTF-8")]
    #[diagnostic(code(builddesc::runner::non_utf8_path))]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },

    /// Ninja ran but reported failure.
    #[error("ninja exited with {status}")]
    #[diagnostic(code(builddesc::runner::ninja_failed))]
    NinjaFailed {
        /// Exit status as reported by the OS.
        status: String,
    },
}
