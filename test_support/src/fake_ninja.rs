//! Fake Ninja executables.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(unix)]
fn make_script_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("read metadata {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_context(|| format!("set permissions {}", path.display()))
}

#[cfg(not(unix))]
fn make_script_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn write_script(dir: &TempDir, body: &str) -> Result<PathBuf> {
    let path = dir.path().join("ninja");
    fs::write(&path, format!("#!/bin/sh\n{body}"))
        .with_context(|| format!("write script {}", path.display()))?;
    make_script_executable(&path)?;
    Ok(path)
}

/// Create a fake Ninja executable that exits with `exit_code`.
///
/// Returns the temporary directory and the path to the executable.
pub fn fake_ninja(exit_code: i32) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new().context("create temp dir")?;
    let path = write_script(&dir, &format!("exit {exit_code}\n"))?;
    Ok((dir, path))
}

/// A fake Ninja that records how it was run.
#[derive(Debug)]
pub struct FakeNinja {
    dir: TempDir,
    /// Path of the executable.
    pub path: PathBuf,
}

impl FakeNinja {
    /// Arguments of the last run, one per element.
    pub fn args(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(self.dir.path().join("args")).context("read recorded arguments")?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Working directory of the last run.
    pub fn cwd(&self) -> Result<PathBuf> {
        let text = fs::read_to_string(self.dir.path().join("cwd")).context("read recorded directory")?;
        Ok(PathBuf::from(text.trim_end()))
    }

    /// Whether the fake has been run at all.
    pub fn ran(&self) -> bool {
        self.dir.path().join("args").exists()
    }
}

/// Create a fake Ninja that records its arguments and working directory,
/// prints a line on stdout and exits successfully.
pub fn fake_ninja_capture() -> Result<FakeNinja> {
    let dir = TempDir::new().context("create temp dir")?;
    let record = dir.path().display().to_string();
    let path = write_script(
        &dir,
        &format!(
            concat!(
                "printf '%s\\n' \"$@\" > '{record}/args'\n",
                "pwd -P > '{record}/cwd'\n",
                "echo 'ninja: no work to do.'\n",
                "exit 0\n"
            ),
            record = record
        ),
    )?;
    Ok(FakeNinja { dir, path })
}
