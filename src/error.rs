//! Error types shared by every build-description phase.
//!
//! Parse-time failures are reported as a [`ParseError`], which names the
//! offending token and the description file it came from. Everything else
//! that can abort graph construction is a [`BuildError`] variant.

// miette/thiserror derive expansion trips `unused_assignments` on some
// toolchains; `#[expect]` would fail on the others.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Classification of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Input ended inside a directive or value list.
    UnexpectedEof,
    /// An argument key was not followed by `[`.
    MissingOpenBracket,
    /// A condition list appeared where conditions cannot be evaluated.
    ConditionsNotAllowed,
    /// A directive name was not followed by `(`.
    MissingOpenParen,
    /// A directive body was not closed by `)`.
    MissingCloseParen,
    /// `CONFIG` appeared twice or not as the first directive.
    DuplicateConfig,
    /// No template is registered under the directive name.
    UnhandledDirective,
    /// A descriptor received keys it does not understand.
    UnknownArgument,
    /// `CONFIG` received a key it does not understand.
    ConfigUnknownArg,
    /// `CONFIG` received a flavored key it does not understand.
    FlavoredConfigUnknownArg,
    /// A `CONFIG` key that requires a flavor was given without one.
    ConfigMustBeFlavored,
    /// A flavored key names a flavor outside the declared universe.
    BadFlavor,
    /// A `ruledeps` entry is not `rule:dep,...`.
    BadRuledeps,
    /// A `srcopts` entry is not `src:opt`.
    BadSrcopts,
    /// A `specialsrcs` entry is malformed.
    BadSpecialSrcs,
    /// A `symlink` entry is not `dst:target`.
    BadSymlink,
    /// No compile handler exists for a source extension.
    UnknownSourceExtension,
    /// An `.enum` source has no `.gperf` stem.
    EnumWithoutGperf,
    /// Two non-install definitions of the same target name.
    MultipleDefinedTarget,
}

impl ParseErrorKind {
    const fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEof => "unexpected end of file",
            Self::MissingOpenBracket => "missing open bracket in parameter",
            Self::ConditionsNotAllowed => "conditions are not allowed here",
            Self::MissingOpenParen => "missing open parenthesis",
            Self::MissingCloseParen => "missing close parenthesis",
            Self::DuplicateConfig => "duplicate CONFIG or CONFIG wasn't first",
            Self::UnhandledDirective => "unhandled build directive",
            Self::UnknownArgument => "unknown argument",
            Self::ConfigUnknownArg => "unrecognized argument in CONFIG",
            Self::FlavoredConfigUnknownArg => "unrecognized flavored argument in CONFIG",
            Self::ConfigMustBeFlavored => "CONFIG argument must be flavored",
            Self::BadFlavor => "flavor does not exist",
            Self::BadRuledeps => "bad ruledeps argument, need ruledeps[rule:dep,...]",
            Self::BadSrcopts => "bad srcopts format, need srcopts[src:opt]",
            Self::BadSpecialSrcs => {
                "bad specialsrcs format, need specialsrcs[rule:src,...:target[:var=val,...]]"
            }
            Self::BadSymlink => "bad symlink format, need symlink[dst:target]",
            Self::UnknownSourceExtension => {
                "invalid source extension (not all extensions can be used in all descriptors)"
            }
            Self::EnumWithoutGperf => "extension .enum without .gperf.enum",
            Self::MultipleDefinedTarget => {
                "multiple defined target, rename your generated intermediate files"
            }
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A structural or schema error found while reading a description file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{builddesc}: {kind} near {token}")]
#[diagnostic(code(builddesc::parse))]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// The token that triggered the error.
    pub token: String,
    /// The description file being read.
    pub builddesc: String,
}

impl ParseError {
    /// Construct a parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, token: impl Into<String>, builddesc: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
            builddesc: builddesc.into(),
        }
    }
}

/// Errors raised while building the graph.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum BuildError {
    /// A description file could not be parsed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] Box<ParseError>),

    /// Reading or writing a file failed.
    #[error("failed to access {path}")]
    #[diagnostic(code(builddesc::io))]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// One or more configured plugins are not linked into this binary.
    #[error("failed to load plugins: {}", plugins.join(", "))]
    #[diagnostic(
        code(builddesc::plugins::missing),
        help("plugins are linked at build time; check the plugins list in CONFIG")
    )]
    MissingPlugins {
        /// Normalised paths of the missing plugins.
        plugins: Vec<String>,
    },

    /// A plugin rejected its start-up or a handler failed.
    #[error("plugin {plugin}: {message}")]
    #[diagnostic(code(builddesc::plugins::failed))]
    Plugin {
        /// Plugin name.
        plugin: String,
        /// Failure description.
        message: String,
    },

    /// The configured shell script exited unsuccessfully.
    #[error("config_script[{script}] failed: {reason}")]
    #[diagnostic(code(builddesc::config::script))]
    ConfigScript {
        /// Script text as given in `CONFIG`.
        script: String,
        /// Exit status or spawn failure.
        reason: String,
    },

    /// The build version probe failed.
    #[error("buildversion_script[{script}] failed: {reason}")]
    #[diagnostic(code(builddesc::config::buildversion))]
    BuildVersion {
        /// Script text.
        script: String,
        /// Exit status or spawn failure.
        reason: String,
    },

    /// None of the compiler candidates satisfied the version policy.
    #[error("couldn't find a compatible compiler among: {}", candidates.join(", "))]
    #[diagnostic(
        code(builddesc::compiler::not_found),
        help("set CC or list a compiler in CONFIG, e.g. compiler[gcc:9.0]")
    )]
    CompilerNotFound {
        /// Candidates that were probed.
        candidates: Vec<String>,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern {pattern}: {message}")]
    #[diagnostic(code(builddesc::glob))]
    Glob {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },
}

impl From<ParseError> for BuildError {
    fn from(err: ParseError) -> Self {
        Self::Parse(Box::new(err))
    }
}

impl BuildError {
    /// Wrap an I/O error with the path that was being accessed.
    #[must_use]
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Return the parse error kind, if this is a parse error.
    #[must_use]
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse(err) => Some(err.kind),
            _ => None,
        }
    }
}
