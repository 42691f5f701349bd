//! Locating the source tree and the rule runtime.

use super::RunnerError;
use crate::ops::{BUILDDESC, BUILDDESC_TOP};
use camino::{Utf8Path, Utf8PathBuf};
use ninja_env::BUILDTOOLDIR_ENV;
use std::ffi::OsString;

/// Marker identifying a rule runtime directory.
const RULES_MARKER: &str = "rules/rules.ninja";

/// Find the top directory of the tree containing `start`.
///
/// Walking upwards, the first directory with a `Builddesc.top` wins.
/// Otherwise the highest directory with a `Builddesc` is used.
///
/// # Errors
///
/// Returns [`RunnerError::TopdirNotFound`] when no ancestor holds either
/// file.
pub fn find_topdir(start: &Utf8Path) -> Result<Utf8PathBuf, RunnerError> {
    let mut highest = None;
    for dir in start.ancestors() {
        if dir.join(BUILDDESC_TOP).is_file() {
            return Ok(dir.to_owned());
        }
        if dir.join(BUILDDESC).is_file() {
            highest = Some(dir.to_owned());
        }
    }
    highest.ok_or_else(|| RunnerError::TopdirNotFound {
        start: start.to_owned(),
    })
}

/// Candidate runtime directories derived from the executable and `$HOME`.
fn fallback_dirs(exe: Option<&Utf8Path>, home: Option<&Utf8Path>) -> Vec<Utf8PathBuf> {
    let mut dirs = Vec::new();
    if let Some(bin) = exe.and_then(Utf8Path::parent) {
        dirs.push(bin.join("../share/builddesc"));
        dirs.push(bin.join(".."));
    }
    if let Some(home_dir) = home {
        dirs.push(home_dir.join(".builddesc"));
    }
    dirs
}

pub(super) fn resolve_buildtooldir_with<F>(
    flag: Option<&Utf8Path>,
    mut read_env: F,
    exe: Option<&Utf8Path>,
) -> Result<Utf8PathBuf, RunnerError>
where
    F: FnMut(&str) -> Option<OsString>,
{
    if let Some(dir) = flag {
        return Ok(dir.to_owned());
    }
    let from_env = |value: OsString| Utf8PathBuf::from_path_buf(value.into()).ok();
    if let Some(dir) = read_env(BUILDTOOLDIR_ENV).and_then(from_env).filter(|d| !d.as_str().is_empty()) {
        return Ok(dir);
    }
    let home = read_env("HOME").and_then(from_env);
    let tried = fallback_dirs(exe, home.as_deref());
    let found = tried.iter().find(|dir| dir.join(RULES_MARKER).is_file()).cloned();
    found.ok_or(RunnerError::BuildtooldirNotFound { tried })
}

/// Directory holding the default rule files.
///
/// In order: the command-line flag, `BUILDTOOLDIR`, `share/builddesc`
/// next to the executable, the executable's parent and `~/.builddesc`.
///
/// # Errors
///
/// Returns [`RunnerError::BuildtooldirNotFound`] when nothing qualifies.
pub fn resolve_buildtooldir(flag: Option<&Utf8Path>) -> Result<Utf8PathBuf, RunnerError> {
    let exe = std::env::current_exe()
        .ok()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok());
    resolve_buildtooldir_with(flag, |key| std::env::var_os(key), exe.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_tempdir(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8");
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, "").expect("write");
        }
        (tmp, root)
    }

    #[test]
    fn nearest_top_file_wins() {
        let (_tmp, root) = utf8_tempdir(&["Builddesc", "proj/Builddesc.top", "proj/lib/Builddesc"]);
        let found = find_topdir(&root.join("proj/lib")).expect("topdir");
        assert_eq!(found, root.join("proj"));
    }

    #[test]
    fn highest_builddesc_without_top_file() {
        let (_tmp, root) = utf8_tempdir(&["a/Builddesc", "a/b/Builddesc", "a/b/c/Builddesc"]);
        let found = find_topdir(&root.join("a/b/c")).expect("topdir");
        assert_eq!(found, root.join("a"));
    }

    #[test]
    fn flag_and_environment_take_precedence() {
        let flag = Utf8Path::new("/opt/tools");
        let found = resolve_buildtooldir_with(Some(flag), |_| None, None).expect("flag");
        assert_eq!(found, flag);

        let from_env = resolve_buildtooldir_with(
            None,
            |key| (key == BUILDTOOLDIR_ENV).then(|| OsString::from("/env/tools")),
            None,
        )
        .expect("env");
        assert_eq!(from_env, Utf8Path::new("/env/tools"));
    }

    #[test]
    fn falls_back_to_installed_share_dir() {
        let (_tmp, root) = utf8_tempdir(&["share/builddesc/rules/rules.ninja", "bin/builddesc"]);
        let exe = root.join("bin/builddesc");
        let found = resolve_buildtooldir_with(None, |_| None, Some(&exe)).expect("share dir");
        assert_eq!(found, root.join("bin/../share/builddesc"));
    }

    #[test]
    fn reports_every_candidate_when_missing() {
        let err = resolve_buildtooldir_with(
            None,
            |key| (key == "HOME").then(|| OsString::from("/nonexistent-home")),
            Some(Utf8Path::new("/nonexistent/bin/builddesc")),
        )
        .expect_err("nothing found");
        let RunnerError::BuildtooldirNotFound { tried } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(tried.len(), 3);
        assert_eq!(tried.last().map(|dir| dir.as_str()), Some("/nonexistent-home/.builddesc"));
    }
}
