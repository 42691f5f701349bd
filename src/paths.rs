//! Lexical helpers for slash-separated build paths.
//!
//! Paths in build descriptions routinely embed Ninja variables such as
//! `$objdir`, so they are manipulated as plain strings rather than as
//! filesystem paths. Joining always cleans the result lexically: empty and
//! `.` segments are dropped and `..` consumes the preceding segment.

use itertools::Itertools;

/// Lexically clean `path`.
///
/// An empty input yields `"."`, and a rooted path never climbs above `/`.
///
/// # Examples
///
/// ```
/// use builddesc::paths::clean;
/// assert_eq!(clean("a/./b/../c/"), "a/c");
/// assert_eq!(clean(""), ".");
/// assert_eq!(clean("/../x"), "/x");
/// ```
#[must_use]
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    let body = segments.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_owned(),
        (false, false) => body,
    }
}

/// Join path elements with `/` and clean the result.
///
/// Empty elements are ignored; if every element is empty the result is an
/// empty string.
///
/// # Examples
///
/// ```
/// use builddesc::paths::join;
/// assert_eq!(join(["src", "lib.c"]), "src/lib.c");
/// assert_eq!(join(["", "lib.c"]), "lib.c");
/// assert_eq!(join(["$objdir/", "a.o"]), "$objdir/a.o");
/// assert_eq!(join(["", ""]), "");
/// ```
#[must_use]
pub fn join<'a, I>(elements: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = elements.into_iter().filter(|e| !e.is_empty()).join("/");
    if joined.is_empty() {
        joined
    } else {
        clean(&joined)
    }
}

/// Return everything before the final `/`, cleaned.
///
/// # Examples
///
/// ```
/// use builddesc::paths::dir;
/// assert_eq!(dir("lib/foo/Builddesc"), "lib/foo");
/// assert_eq!(dir("Builddesc"), ".");
/// ```
#[must_use]
pub fn dir(path: &str) -> String {
    match path.rfind('/') {
        None => ".".to_owned(),
        Some(0) => "/".to_owned(),
        Some(idx) => clean(path.get(..idx).unwrap_or_default()),
    }
}

/// Return the final path element.
#[must_use]
pub fn base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Split `name` into its stem and extension at the last `.`.
///
/// A name without a `.` reports the extension `"."`, which never matches a
/// registered handler.
#[must_use]
pub fn split_ext(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map_or(0, |idx| idx + 1);
    match name.rfind('.') {
        Some(idx) if idx >= file_start => (
            name.get(..idx).unwrap_or(name),
            name.get(idx + 1..).unwrap_or_default(),
        ),
        _ => (name, "."),
    }
}

/// Resolve `path` against `basedir` when it is explicitly relative.
///
/// Only paths starting with `.` are joined; anything else is taken to be
/// relative to the top directory already, or absolute.
///
/// # Examples
///
/// ```
/// use builddesc::paths::normalize;
/// assert_eq!(normalize("lib/foo", "./gen"), "lib/foo/gen");
/// assert_eq!(normalize("lib/foo", "../bar"), "lib/bar");
/// assert_eq!(normalize("lib/foo", "common/inc"), "common/inc");
/// ```
#[must_use]
pub fn normalize(basedir: &str, path: &str) -> String {
    if path.starts_with('.') {
        join([basedir, path])
    } else {
        path.to_owned()
    }
}

/// Return `true` if `pattern` contains glob metacharacters.
#[must_use]
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}
