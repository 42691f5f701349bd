//! The top `build.ninja`.

use super::{Renderer, write_list};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

pub(super) struct TopFile<'a> {
    r: &'a Renderer<'a>,
    builddescs: Vec<&'a str>,
}

impl<'a> TopFile<'a> {
    pub(super) fn new(r: &'a Renderer<'a>) -> Self {
        let builddescs = r
            .ops
            .builddescs
            .iter()
            .map(String::as_str)
            .sorted_unstable()
            .dedup()
            .collect();
        Self { r, builddescs }
    }
}

impl Display for TopFile<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ops = self.r.ops;
        let config = &ops.config;
        let toppath = &config.buildpath;
        let args = self.r.inv.args;
        let buildtooldir = self.r.inv.buildtooldir;

        writeln!(f, "# {args}")?;
        writeln!(f, "# {buildtooldir}")?;
        writeln!(f, "# Flavors: {}", config.active_flavors.join(", "))?;
        writeln!(f, "# Conditions: {}", config.conditions.iter().join(", "))?;

        writeln!(f, "builddir={toppath}")?;
        writeln!(f, "buildpath={toppath}")?;
        writeln!(f, "cc={}", ops.compiler.cc)?;
        writeln!(f, "cxx={}", ops.compiler.cxx)?;
        writeln!(f, "gopath=$$GOPATH")?;
        writeln!(f, "gobuild_flags=$$GOBUILD_FLAGS")?;
        writeln!(f, "gobuild_test_flags=$$GOBUILD_TEST_FLAGS")?;
        writeln!(f, "cgo_enabled=$$CGO_ENABLED")?;
        writeln!(f, "build_build = {args}")?;
        writeln!(f, "buildtooldir={buildtooldir}")?;
        writeln!(f, "inconfig = $buildtooldir/scripts/invars.sh")?;
        let joined = config.configvars.join(" ");
        let configvars = match joined.trim() {
            "" => "/dev/null",
            trimmed => trimmed,
        };
        writeln!(f, "configvars = {configvars}")?;

        writeln!(f, "include $buildtooldir/rules/defaults.ninja")?;
        for param in &config.buildparams {
            writeln!(f, "{param}")?;
        }
        if let Some(path) = self.r.rule_file(&config.compiler_rule_dir, &ops.compiler.flavor) {
            writeln!(f, "include {path}")?;
        }
        for inc in config.configvars.iter().chain(&config.rules) {
            writeln!(f, "include {inc}")?;
        }
        writeln!(f, "include $buildtooldir/rules/rules.ninja")?;
        if !config.godeps.is_empty() {
            writeln!(
                f,
                "build {}: {} {}",
                config.godeps_stamp(),
                config.godeps_rule,
                config.godeps.join(" ")
            )?;
        }

        for flavor in &config.active_flavors {
            writeln!(f, "subninja {toppath}/obj/{flavor}/build.ninja")?;
        }
        for bd in &self.builddescs {
            writeln!(f, "build {bd}: phony")?;
        }
        write!(f, "build {toppath}/build.ninja: generate_ninjas")?;
        for bd in &self.builddescs {
            write!(f, " {bd}")?;
        }
        write_list(f, &ops.plugin_deps())?;
        writeln!(f)?;

        writeln!(f, "build all: phony {}", config.active_flavors.join(" "))?;
        writeln!(f, "default all")
    }
}
