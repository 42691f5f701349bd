//! Shell collaborators configured from `CONFIG`.
//!
//! `config_script` emits extra conditions and build parameters;
//! `buildversion_script` prints the version stamped into every flavor.

use crate::error::{BuildError, Result};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Interpreted output of a config script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// `key=value` lines, copied verbatim into the top build file.
    pub buildparams: Vec<String>,
    /// Bare words, each a condition.
    pub conditions: Vec<String>,
}

/// Classify the lines a config script printed.
///
/// # Examples
///
/// ```
/// use builddesc::config::script::interpret;
/// let out = interpret("linux\n  cflags=-O2 \n\n");
/// assert_eq!(out.conditions, ["linux"]);
/// assert_eq!(out.buildparams, ["cflags=-O2"]);
/// ```
#[must_use]
pub fn interpret(stdout: &str) -> ScriptOutput {
    let mut out = ScriptOutput::default();
    for line in stdout.lines().map(str::trim) {
        if line.contains('=') {
            out.buildparams.push(line.to_owned());
        } else if !line.is_empty() {
            out.conditions.push(line.to_owned());
        }
    }
    out
}

fn run_shell(script: &str) -> std::result::Result<String, String> {
    debug!(script, "running shell snippet");
    let output = Command::new("sh")
        .arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|err| err.to_string())?;
    if !output.status.success() {
        return Err(output.status.to_string());
    }
    String::from_utf8(output.stdout).map_err(|err| err.to_string())
}

/// Run `script` with `sh -c` and interpret its output.
///
/// # Errors
///
/// Returns [`BuildError::ConfigScript`] if the script cannot be spawned or
/// exits unsuccessfully.
pub fn run_config_script(script: &str) -> Result<ScriptOutput> {
    run_shell(script)
        .map(|stdout| interpret(&stdout))
        .map_err(|reason| BuildError::ConfigScript {
            script: script.to_owned(),
            reason,
        })
}

/// A build version probe running on a background thread.
#[derive(Debug)]
pub struct BuildVersionProbe {
    script: String,
    handle: JoinHandle<std::result::Result<String, String>>,
}

impl BuildVersionProbe {
    /// Start `script` in the background.
    #[must_use]
    pub fn spawn(script: &str) -> Self {
        let owned = script.to_owned();
        let handle = thread::spawn(move || run_shell(&owned).map(|out| out.trim().to_owned()));
        Self {
            script: script.to_owned(),
            handle,
        }
    }

    /// Wait for the probe and return the trimmed version.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::BuildVersion`] if the script failed or the
    /// probe thread panicked.
    pub fn join(self) -> Result<String> {
        let outcome = self
            .handle
            .join()
            .unwrap_or_else(|_| Err("probe thread panicked".to_owned()));
        outcome.map_err(|reason| BuildError::BuildVersion {
            script: self.script,
            reason,
        })
    }
}
