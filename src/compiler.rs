//! C compiler detection.
//!
//! Candidates come from `CONFIG`'s `compiler` list, then `CC`, then the
//! usual suspects. Each is asked for its version with `-v`; the first one
//! meeting the minimum version wins. A candidate may carry its own minimum
//! as `name:version`.

use crate::error::{BuildError, Result};
use crate::ops::GlobalOps;
use semver::Version;
use serde::Serialize;
use std::process::{Command, Stdio};
use tracing::debug;

/// Compilers probed after the configured ones.
const FALLBACK_COMPILERS: [&str; 3] = ["gcc", "clang", "cc"];

/// Identity of the detected compiler pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerId {
    /// C compiler command.
    pub cc: String,
    /// C++ compiler command.
    pub cxx: String,
    /// Compiler family, used to pick rule files.
    pub flavor: String,
}

impl Default for CompilerId {
    fn default() -> Self {
        Self {
            cc: "cc".to_owned(),
            cxx: "c++".to_owned(),
            flavor: "gcc".to_owned(),
        }
    }
}

/// Checks finalized descriptors ask for before output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionCheck {
    /// Find a usable C compiler.
    Cc,
}

/// Runs a compiler to learn its version.
#[cfg_attr(test, mockall::automock)]
pub trait CompilerProbe {
    /// Combined output of `command -v`, or `None` if it could not run.
    fn version_output(&self, command: &[String]) -> Option<String>;
}

/// Probes by spawning the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProbe;

impl CompilerProbe for ProcessProbe {
    fn version_output(&self, command: &[String]) -> Option<String> {
        let (program, args) = command.split_first()?;
        let output = Command::new(program)
            .args(args)
            .arg("-v")
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Some(text)
    }
}

/// Loose `major[.minor]` parse; anything unparsable counts as zero.
fn loose_version(text: &str) -> Version {
    let mut parts = text.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    Version::new(major, minor, 0)
}

/// Find `<family> version <major>.<minor>` in compiler output.
///
/// The words must be separated by exactly one space, and the family is
/// the run of non-whitespace directly before ` version `.
fn parse_version(output: &str) -> Option<(String, Version)> {
    output.match_indices(" version ").find_map(|(at, keyword)| {
        let family = output.get(..at)?.rsplit(char::is_whitespace).next()?;
        let number = output.get(at + keyword.len()..)?;
        let major: String = number.chars().take_while(char::is_ascii_digit).collect();
        let minor: String = number
            .get(major.len()..)?
            .strip_prefix('.')?
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if family.is_empty() || major.is_empty() || minor.is_empty() {
            return None;
        }
        Some((family.to_owned(), loose_version(&format!("{major}.{minor}"))))
    })
}

/// Derive the C++ compiler name from the C compiler name.
///
/// # Examples
///
/// ```
/// use builddesc::compiler::cxx_for;
/// assert_eq!(cxx_for("x86_64-linux-gnu-gcc"), "x86_64-linux-gnu-g++");
/// assert_eq!(cxx_for("clang-4.0"), "clang++-4.0");
/// assert_eq!(cxx_for("clang"), "clang++");
/// ```
#[must_use]
pub fn cxx_for(cc: &str) -> String {
    if cc.contains("gcc") {
        cc.replacen("gcc", "g++", 1)
    } else if cc.contains("cc") {
        cc.replacen("cc", "c++", 1)
    } else if let Some((head, tail)) = cc.split_once('-') {
        format!("{head}++-{tail}")
    } else {
        format!("{cc}++")
    }
}

fn meets_minimum(family: &str, version: &Version, explicit: Option<&str>) -> bool {
    if explicit.is_some_and(|min| *version < loose_version(min)) {
        return false;
    }
    match family {
        "gcc" => *version >= Version::new(4, 8, 0),
        "clang" => *version >= Version::new(3, 4, 0),
        _ => true,
    }
}

/// Pick the first usable compiler.
///
/// # Errors
///
/// Returns [`BuildError::CompilerNotFound`] if no candidate qualifies.
pub fn detect(configured: &[String], env_cc: Option<&str>, probe: &dyn CompilerProbe) -> Result<CompilerId> {
    let candidates: Vec<String> = configured
        .iter()
        .cloned()
        .chain(env_cc.filter(|cc| !cc.is_empty()).map(str::to_owned))
        .chain(FALLBACK_COMPILERS.iter().map(|cc| (*cc).to_owned()))
        .collect();

    for candidate in &candidates {
        let (cc, explicit) = match candidate.split_once(':') {
            Some((cc, min)) => (cc, Some(min)),
            None => (candidate.as_str(), None),
        };
        let command: Vec<String> = cc.split(' ').map(str::to_owned).collect();
        let Some((family, version)) = probe.version_output(&command).as_deref().and_then(parse_version) else {
            debug!(compiler = cc, "no usable version output");
            continue;
        };
        if !meets_minimum(&family, &version, explicit) {
            debug!(compiler = cc, %version, "compiler too old");
            continue;
        }
        let id = CompilerId {
            cc: cc.to_owned(),
            cxx: cxx_for(cc),
            flavor: family,
        };
        debug!(cc = %id.cc, cxx = %id.cxx, flavor = %id.flavor, %version, "compilers detected");
        return Ok(id);
    }
    Err(BuildError::CompilerNotFound { candidates })
}

impl GlobalOps {
    /// Run every check requested by finalized descriptors.
    ///
    /// # Errors
    ///
    /// Fails if a check fails, e.g. no compiler qualifies.
    pub fn run_version_checks(&mut self, probe: &dyn CompilerProbe, env_cc: Option<&str>) -> Result<()> {
        for check in self.version_checks.clone() {
            match check {
                VersionCheck::Cc => {
                    self.compiler = detect(&self.config.compiler, env_cc, probe)?;
                }
            }
        }
        Ok(())
    }
}
