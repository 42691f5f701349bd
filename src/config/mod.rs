//! Build-wide configuration read from the leading `CONFIG` directive.
//!
//! [`Config`] starts out with host defaults and is then amended by
//! `CONFIG`, the optional config script and plugin start-up. Per-flavor
//! settings live in [`FlavorConfig`].

mod parse;
pub mod script;

use crate::args::Conditions;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Flavor used when `CONFIG` declares none.
pub const DEFAULT_FLAVOR: &str = "dev";
/// Build output directory used when neither `BUILDPATH` nor `CONFIG` set one.
pub const DEFAULT_BUILDPATH: &str = "build";

/// Global build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Whether a directive has been seen; `CONFIG` must come first.
    #[serde(skip)]
    pub seen: bool,
    /// Conditions that hold for this build.
    pub conditions: Conditions,
    /// `key=value` lines passed through verbatim to the top build file.
    pub buildparams: Vec<String>,
    /// Every declared flavor.
    pub all_flavors: BTreeSet<String>,
    /// Declared flavors left after `--with-flavor`/`--without-flavor`.
    pub active_flavors: Vec<String>,
    /// Plugin paths to start.
    pub plugins: Vec<String>,
    /// Files with global Ninja variables.
    pub configvars: Vec<String>,
    /// Files with Ninja rules.
    pub rules: Vec<String>,
    /// Files included by every flavor.
    pub extravars: Vec<String>,
    /// Extra inputs for the `in` rule script.
    pub invars: Vec<String>,
    /// Directory of `<compiler>.ninja` rule files.
    pub compiler_rule_dir: String,
    /// Directory of `<flavor>.ninja` rule files.
    pub flavor_rule_dir: String,
    /// Directory of `<compiler>-<flavor>.ninja` rule files.
    pub compiler_flavor_rule_dir: String,
    /// Extra dependencies for every target built with a rule.
    pub ruledeps: BTreeMap<String, Vec<String>>,
    /// Descriptor argument keys exported as Ninja variables.
    pub buildvars: Vec<String>,
    /// Compiler candidates, optionally suffixed with `:<min-version>`.
    pub compiler: Vec<String>,
    /// Dependency lists for managed-runtime builds.
    pub godeps: Vec<String>,
    /// Rule producing the managed-runtime dependency stamp.
    pub godeps_rule: String,
    /// Shell snippet printing the build version.
    pub buildversion_script: String,
    /// Build output directory.
    pub buildpath: String,
    /// Shell snippet emitting extra conditions and build parameters.
    pub config_script: String,
    /// Built-in variables handed to the `in` rule.
    pub builtin_invars: String,
}

/// Per-flavor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlavorConfig {
    /// Installation prefix below the flavor root.
    pub prefix: String,
    /// Files included by this flavor only.
    pub extravars: Vec<String>,
    /// Compiler flags for this flavor.
    pub cflags: String,
}

impl Config {
    /// Configuration before `CONFIG` has been read.
    ///
    /// `buildpath` is the externally supplied default output directory,
    /// usually taken from the `BUILDPATH` environment variable.
    #[must_use]
    pub fn new(buildpath: Option<&str>) -> Self {
        let mut ruledeps = BTreeMap::new();
        ruledeps.insert(
            "in".to_owned(),
            vec!["$inconf".to_owned(), "$configvars".to_owned()],
        );
        Self {
            seen: false,
            conditions: host_conditions(),
            buildparams: Vec::new(),
            all_flavors: BTreeSet::from([DEFAULT_FLAVOR.to_owned()]),
            active_flavors: vec![DEFAULT_FLAVOR.to_owned()],
            plugins: Vec::new(),
            configvars: Vec::new(),
            rules: Vec::new(),
            extravars: Vec::new(),
            invars: Vec::new(),
            compiler_rule_dir: "$buildtooldir/rules/compiler".to_owned(),
            flavor_rule_dir: "$buildtooldir/rules/flavor".to_owned(),
            compiler_flavor_rule_dir: "$buildtooldir/rules/compiler-flavor".to_owned(),
            ruledeps,
            buildvars: Vec::new(),
            compiler: Vec::new(),
            godeps: Vec::new(),
            godeps_rule: "godeps".to_owned(),
            buildversion_script: "git rev-list HEAD 2>/dev/null|wc -l|xargs".to_owned(),
            buildpath: buildpath
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_BUILDPATH)
                .to_owned(),
            config_script: String::new(),
            builtin_invars: String::new(),
        }
    }

    /// Path of the managed-runtime dependency stamp.
    #[must_use]
    pub fn godeps_stamp(&self) -> String {
        crate::paths::join([self.buildpath.as_str(), "obj/_go/.stamp"])
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Conditions describing the host: operating system and architecture.
///
/// Names follow the conventional spellings used in description files,
/// so `macos` is reported as `darwin` and `aarch64` as `arm64`.
#[must_use]
pub fn host_conditions() -> Conditions {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "aarch64" => "arm64",
        other => other,
    };
    Conditions::from([os.to_owned(), arch.to_owned()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_in_rule_deps() {
        let config = Config::new(None);
        assert_eq!(
            config.ruledeps.get("in"),
            Some(&vec!["$inconf".to_owned(), "$configvars".to_owned()])
        );
        assert_eq!(config.active_flavors, ["dev"]);
        assert_eq!(config.buildpath, "build");
    }

    #[test]
    fn external_buildpath_wins_over_default() {
        assert_eq!(Config::new(Some("/tmp/out")).buildpath, "/tmp/out");
        assert_eq!(Config::new(Some("")).buildpath, "build");
    }

    #[test]
    fn godeps_stamp_lives_under_buildpath() {
        assert_eq!(Config::new(Some("out")).godeps_stamp(), "out/obj/_go/.stamp");
    }
}
