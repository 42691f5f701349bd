//! Managed-runtime descriptors: `GOPROG`, `GOTEST` and `GOMODULE`.
//!
//! All three build the package in the descriptor's source directory with the
//! `gobuild` rule; they differ in the `gomode` they pass and in the extra
//! test, coverage and benchmark edges `GOTEST` adds.

use super::general::GeneralDesc;
use super::link::{GoLinkMode, LinkDesc};
use super::target::{Target, TargetOption};
use crate::args::ArgMap;
use crate::error::Result;
use crate::ops::GlobalOps;

/// What a managed-runtime descriptor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoMode {
    /// A standalone program.
    Program,
    /// A loadable shared object.
    Loadable,
    /// A test binary plus test, coverage and benchmark runs.
    Test,
}

impl GoMode {
    pub(super) const fn extra_keys(self) -> &'static [&'static str] {
        match self {
            Self::Program => &["gopkg", "nocgo", "goos", "goarch"],
            Self::Loadable => &["gopkg", "goos", "goarch"],
            Self::Test => &["gopkg", "benchflags"],
        }
    }
}

/// Managed-runtime descriptor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoDesc {
    /// Link record; only libraries and include dependencies are used.
    pub link: LinkDesc,
    /// What to build.
    pub mode: GoMode,
    /// Package path passed to the build tool.
    pub pkg: String,
    /// Build without cgo.
    pub nocgo: bool,
    /// Target operating system.
    pub goos: String,
    /// Target architecture.
    pub goarch: String,
    /// Benchmark filter for `GOTEST`.
    pub benchflags: String,
}

fn joined(args: &ArgMap, key: &str) -> String {
    args.get(key).map(|values| values.join(" ")).unwrap_or_default()
}

fn add_godeps(target: &mut Target, ops: &GlobalOps) {
    if !ops.config.godeps.is_empty() {
        target.deps.push(ops.config.godeps_stamp());
    }
}

/// Main `gobuild` edge, carrying the template's destination and options.
fn add_build(g: &mut GeneralDesc, ops: &GlobalOps, name: &str, args: Vec<String>) -> Result<()> {
    let destdir = g.destdir.clone();
    let options = g.target_options.clone();
    let srcdir = g.srcdir.clone();
    let target = g.add_target(name, "gobuild", vec![srcdir], &destdir, "")?;
    target.with_args(args).with_options(options);
    add_godeps(target, ops);
    Ok(())
}

impl GoDesc {
    /// Template for `mode`.
    #[must_use]
    pub fn template(mode: GoMode) -> Self {
        Self {
            link: LinkDesc::default(),
            mode,
            pkg: String::new(),
            nocgo: false,
            goos: String::new(),
            goarch: String::new(),
            benchflags: String::new(),
        }
    }

    pub(super) fn instantiate(&self) -> Self {
        Self {
            link: self.link.instantiate(),
            ..Self::template(self.mode)
        }
    }

    pub(super) fn parse_args(&mut self, args: &ArgMap) {
        self.pkg = joined(args, "gopkg");
        self.nocgo = args.contains_key("nocgo");
        self.goos = joined(args, "goos");
        self.goarch = joined(args, "goarch");
        self.benchflags = joined(args, "benchflags");
    }

    fn base_args(&self, ops: &GlobalOps, link: GoLinkMode) -> Vec<String> {
        let mut args = vec![format!("ldlibs={}", self.link.ldlibs_as_lib(ops, link))];
        if !self.pkg.is_empty() {
            args.push(format!("gopkg={}", self.pkg));
        }
        args
    }

    fn platform_args(&self, args: &mut Vec<String>) {
        if !self.goos.is_empty() {
            args.push(format!("goos={}", self.goos));
        }
        if !self.goarch.is_empty() {
            args.push(format!("goarch={}", self.goarch));
        }
    }

    pub(super) fn finalize(&mut self, g: &mut GeneralDesc, ops: &GlobalOps) -> Result<()> {
        self.link.finalize_incdeps(g, ops);
        match self.mode {
            GoMode::Program => self.finalize_program(g, ops),
            GoMode::Loadable => self.finalize_loadable(g, ops),
            GoMode::Test => self.finalize_test(g, ops),
        }
    }

    fn finalize_program(&self, g: &mut GeneralDesc, ops: &GlobalOps) -> Result<()> {
        let mut args = self.base_args(ops, GoLinkMode::Static);
        args.push(if self.nocgo { "gomode=prog-nocgo" } else { "gomode=prog" }.to_owned());
        self.platform_args(&mut args);
        let name = g.target_name.clone();
        add_build(g, ops, &name, args)
    }

    fn finalize_loadable(&self, g: &mut GeneralDesc, ops: &GlobalOps) -> Result<()> {
        let mut args = self.base_args(ops, GoLinkMode::Pic);
        args.push("gomode=plugin".to_owned());
        self.platform_args(&mut args);
        let name = format!("{}.so", g.target_name);
        add_build(g, ops, &name, args)
    }

    fn finalize_test(&self, g: &mut GeneralDesc, ops: &GlobalOps) -> Result<()> {
        let name = g.target_name.clone();
        let srcdir = g.srcdir.clone();
        let args = self.base_args(ops, GoLinkMode::Static);

        let mut test_args = args.clone();
        test_args.push("gomode=test-prog".to_owned());
        add_build(g, ops, &format!("{name}.test"), test_args)?;

        let run_options = [TargetOption::Incdeps, TargetOption::Libdeps];
        let test = g.add_target(&format!("gotest/{name}"), "gotest", vec![srcdir.clone()], "destroot", "")?;
        test.with_args(args.clone()).with_options(run_options);
        add_godeps(test, ops);
        test.collect_as = Some("_gotest".to_owned());

        let coverage = format!("gocover/{name}-coverage");
        let cover = g.add_target(&coverage, "gocover", vec![srcdir.clone()], "destroot", "")?;
        cover.with_args(args.clone()).with_options(run_options);
        add_godeps(cover, ops);

        let html = g.add_target(&format!("{coverage}.html"), "gocover_html", vec![coverage], "destroot", "")?;
        html.with_args(args.clone());
        html.collect_as = Some("_gocover".to_owned());

        let benchflags = if self.benchflags.is_empty() { "." } else { self.benchflags.as_str() };
        let mut bench_args = args;
        bench_args.push(format!("benchflags={benchflags}"));
        let bench = g.add_target(&format!("gobench/{name}"), "gobench", vec![srcdir], "destroot", "")?;
        bench.with_args(bench_args).with_options(run_options);
        add_godeps(bench, ops);
        bench.collect_as = Some("_gobench".to_owned());
        Ok(())
    }
}
