#![forbid(unsafe_code)]

//! Environment variable names shared by the `builddesc` binary and its test
//! helpers.

/// Environment variable override for the Ninja executable.
///
/// # Examples
///
/// ```
/// use ninja_env::NINJA_ENV;
/// assert_eq!(NINJA_ENV, "BUILDDESC_NINJA");
/// ```
pub const NINJA_ENV: &str = "BUILDDESC_NINJA";

/// Environment variable naming the default build output directory.
pub const BUILDPATH_ENV: &str = "BUILDPATH";

/// Environment variable naming the rule runtime directory.
pub const BUILDTOOLDIR_ENV: &str = "BUILDTOOLDIR";

/// Set by the regeneration rule so a re-run never hands off to an
/// existing build file.
pub const REGENERATE_ENV: &str = "BUILDDESC_REGENERATE";
