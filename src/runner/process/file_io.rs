//! Writing generated files into the tree and text to stdout.

use crate::ninja_gen::{Output, OutputFile};
use anyhow::{Context, Result as AnyResult, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::{self, Write};
use tracing::{debug, info};

/// Write `content` to `path` below `dir`, creating parent directories.
///
/// With `only_if_changed`, an existing file with identical contents is
/// left alone so Ninja does not see a newer timestamp.
///
/// Returns whether the file was written.
///
/// # Errors
///
/// Fails if a directory cannot be created or the file cannot be written.
pub fn write_file(dir: &Dir, path: &Utf8Path, content: &str, only_if_changed: bool) -> AnyResult<bool> {
    if only_if_changed
        && dir
            .read_to_string(path)
            .is_ok_and(|existing| existing == content)
    {
        debug!(path = %path, "unchanged, not rewritten");
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        dir.create_dir_all(parent)
            .with_context(|| format!("create directory {parent}"))?;
    }
    let mut file = dir
        .create(path)
        .with_context(|| format!("create {path}"))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("write {path}"))?;
    file.flush().with_context(|| format!("flush {path}"))?;
    Ok(true)
}

/// Open the nearest existing ancestor of an absolute `path`.
///
/// Relative paths resolve against `root`.
fn derive_dir_and_relative(root: &Dir, path: &Utf8Path) -> AnyResult<(Dir, Utf8PathBuf)> {
    if path.is_relative() {
        let dir = root.try_clone().context("duplicate top directory handle")?;
        return Ok((dir, path.to_owned()));
    }

    let mut ancestors = path.ancestors();
    ancestors.next();
    let (base, dir) = ancestors
        .find_map(|candidate| {
            Dir::open_ambient_dir(candidate, ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| anyhow!("no existing ancestor directory for {path}"))?;
    let relative = path
        .strip_prefix(&base)
        .context("derive path relative to ancestor")?
        .to_owned();
    Ok((dir, relative))
}

fn write_output_file(root: &Dir, file: &OutputFile) -> AnyResult<()> {
    let path = Utf8Path::new(&file.path);
    let (dir, relative) = derive_dir_and_relative(root, path)?;
    if write_file(&dir, &relative, &file.contents, file.only_if_changed)? {
        debug!(path = %path, "wrote Ninja file");
    }
    Ok(())
}

fn create_output_dir(root: &Dir, dir: &str) -> AnyResult<()> {
    let path = Utf8Path::new(dir);
    if path.is_absolute() {
        let (base, relative) = derive_dir_and_relative(root, path)?;
        if relative.as_str().is_empty() {
            return Ok(());
        }
        return base
            .create_dir_all(&relative)
            .with_context(|| format!("create directory {dir}"));
    }
    root.create_dir_all(path)
        .with_context(|| format!("create directory {dir}"))
}

/// Create every output directory, then write every file, below `root`.
///
/// # Errors
///
/// Stops at the first directory or file that cannot be written.
pub fn write_output(root: &Dir, output: &Output) -> AnyResult<()> {
    for dir in &output.dirs {
        create_output_dir(root, dir)?;
    }
    for file in &output.files {
        write_output_file(root, file)?;
    }
    info!(files = output.files.len(), "wrote Ninja files");
    Ok(())
}

/// Read the first line of `path`, if the file exists.
///
/// Relative paths resolve against `root`.
#[must_use]
pub fn first_line(root: &Dir, path: &Utf8Path) -> Option<String> {
    let (dir, relative) = derive_dir_and_relative(root, path).ok()?;
    let text = dir.read_to_string(&relative).ok()?;
    text.lines().next().map(str::to_owned)
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

/// Write `text` to stdout; a closed pipe is not an error.
///
/// # Errors
///
/// Fails on any other write error.
pub fn write_stdout(text: &str) -> AnyResult<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err).context("write to stdout"),
    }
}
