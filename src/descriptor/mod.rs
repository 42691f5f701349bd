//! Descriptors: one parsed build directive and the targets it owns.
//!
//! A descriptor starts life as an immutable template registered under a
//! directive name. Each directive instantiates a fresh copy, parses its
//! arguments into it, and after every file has been read the copy is
//! finalized exactly once. The shared state lives in [`GeneralDesc`]; the
//! kind-specific state and behaviour in [`DescriptorKind`].

mod compile;
mod general;
mod goprog;
mod install;
mod library;
mod link;
mod module;
mod prog;
mod target;
pub mod templates;

pub use general::GeneralDesc;
pub use goprog::{GoDesc, GoMode};
pub use install::{INSTALL_COMMANDS, InstallDesc};
pub use library::LibDesc;
pub use link::{GoLinkMode, LINK_KEYS, LinkDesc};
pub use target::{Target, TargetOption, TargetOptions, resolve_dest};

use crate::args::{ArgMap, Args, ParsedArgs};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ops::GlobalOps;
use crate::paths;
use crate::scanner::Scanner;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A `specialsrcs` entry, or any target created outside extension dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialSrc {
    /// Target name; a comma-separated list makes a multi-target.
    pub target: String,
    /// Ninja rule.
    pub rule: String,
    /// Globbed sources. A single empty source means none.
    pub sources: Vec<String>,
    /// Destination alias.
    pub destdir: String,
    /// Directory the sources were found in.
    pub srcdir: String,
    /// `key=value` edge arguments.
    pub extraargs: Vec<String>,
    /// Emission flags.
    pub options: TargetOptions,
}

/// Behaviour of a plugin-defined descriptor kind.
pub trait CustomKind: fmt::Debug + Send + Sync {
    /// Parse `args` into `desc`.
    ///
    /// Implementations normally start with [`Descriptor::generic_parse`],
    /// naming their own keys as extras.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn parse(&self, desc: &mut Descriptor, ops: &mut GlobalOps, realsrcdir: &str, args: &ArgMap) -> Result<()>;

    /// Add the kind's final targets.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn finalize(&self, _desc: &mut Descriptor, _ops: &mut GlobalOps) -> Result<()> {
        Ok(())
    }
}

/// Step run after a descriptor's collected variables are recorded.
pub trait FinalizeHook: fmt::Debug + Send + Sync {
    /// Adjust `desc` with everything collected so far.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn finalize(&self, desc: &mut Descriptor, ops: &mut GlobalOps) -> Result<()>;
}

/// Kind-specific part of a descriptor.
#[derive(Debug, Clone)]
pub enum DescriptorKind {
    /// No behaviour beyond generic parsing.
    General,
    /// Behaviour supplied by a plugin.
    Custom(Arc<dyn CustomKind>),
    /// `PROG`, `TOOL_PROG`.
    Prog(LinkDesc),
    /// `LIB`, `LINKERSET_LIB`.
    Lib(LibDesc),
    /// `MODULE`.
    Module(LinkDesc),
    /// `GOPROG`, `GOTEST`, `GOMODULE`.
    Go(GoDesc),
    /// `INSTALL`, `TOOL_INSTALL`.
    Install(InstallDesc),
}

impl DescriptorKind {
    fn instantiate(&self) -> Self {
        match self {
            Self::General => Self::General,
            Self::Custom(kind) => Self::Custom(Arc::clone(kind)),
            Self::Prog(link) => Self::Prog(link.instantiate()),
            Self::Lib(lib) => Self::Lib(lib.instantiate()),
            Self::Module(link) => Self::Module(link.instantiate()),
            Self::Go(go) => Self::Go(go.instantiate()),
            Self::Install(_) => Self::Install(InstallDesc::default()),
        }
    }

    /// Link record of linking kinds.
    #[must_use]
    pub const fn link(&self) -> Option<&LinkDesc> {
        match self {
            Self::Prog(link) | Self::Module(link) => Some(link),
            Self::Lib(lib) => Some(&lib.link),
            Self::Go(go) => Some(&go.link),
            Self::General | Self::Custom(_) | Self::Install(_) => None,
        }
    }

    /// Mutable link record of linking kinds.
    pub const fn link_mut(&mut self) -> Option<&mut LinkDesc> {
        match self {
            Self::Prog(link) | Self::Module(link) => Some(link),
            Self::Lib(lib) => Some(&mut lib.link),
            Self::Go(go) => Some(&mut go.link),
            Self::General | Self::Custom(_) | Self::Install(_) => None,
        }
    }

    fn extra_keys(&self) -> Vec<&'static str> {
        match self {
            Self::Lib(_) => vec!["includes", "incprefix"],
            Self::Go(go) => go.mode.extra_keys().to_vec(),
            Self::Install(_) => {
                let mut keys = vec!["symlink"];
                keys.extend(INSTALL_COMMANDS.iter().map(|(key, _)| *key));
                keys
            }
            Self::General | Self::Custom(_) | Self::Prog(_) | Self::Module(_) => Vec::new(),
        }
    }
}

/// A build directive: shared state, kind and finalize hooks.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// State common to every kind.
    pub general: GeneralDesc,
    /// Kind-specific state.
    pub kind: DescriptorKind,
    /// Steps added by special-source handlers.
    pub finalize_hooks: Vec<Arc<dyn FinalizeHook>>,
}

impl Descriptor {
    /// Assemble a template.
    #[must_use]
    pub const fn new(general: GeneralDesc, kind: DescriptorKind) -> Self {
        Self {
            general,
            kind,
            finalize_hooks: Vec::new(),
        }
    }

    /// Fresh instance of this template for one directive.
    #[must_use]
    pub fn instantiate(&self, builddesc: &str, target_name: &str, flavors: Vec<String>) -> Self {
        Self::new(
            self.general.instantiate(builddesc, target_name, flavors),
            self.kind.instantiate(),
        )
    }

    /// Parse directive arguments relative to `realsrcdir`.
    ///
    /// # Errors
    ///
    /// Returns the first schema error, or any collaborator failure.
    pub fn parse(&mut self, ops: &mut GlobalOps, realsrcdir: &str, args: &ArgMap) -> Result<()> {
        if let DescriptorKind::Custom(custom) = &self.kind {
            let behaviour = Arc::clone(custom);
            return behaviour.parse(self, ops, realsrcdir, args);
        }

        if let Some(link) = self.kind.link_mut() {
            link.parse_args(&ops.registry, realsrcdir, args)?;
        }
        if let DescriptorKind::Install(install) = &mut self.kind {
            install.glob_installs(ops, realsrcdir, args);
        }

        let extra = self.kind.extra_keys();
        self.generic_parse(ops, realsrcdir, args, &extra)?;

        match &mut self.kind {
            DescriptorKind::Lib(lib) => {
                lib.parse_includes(&mut self.general, args)?;
                ops.libs.register(lib.info(&self.general.target_name));
            }
            DescriptorKind::Go(go) => go.parse_args(args),
            DescriptorKind::Install(install) => install.parse_symlinks(&self.general, args)?,
            DescriptorKind::General
            | DescriptorKind::Custom(_)
            | DescriptorKind::Prog(_)
            | DescriptorKind::Module(_) => {}
        }
        Ok(())
    }

    /// Parse the keys every descriptor understands.
    ///
    /// `extra` names keys the caller consumes itself. Linking kinds also
    /// accept the link keys and plugin linker parameters. Any other key
    /// is an error naming all of them, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::UnknownArgument`] for unconsumed keys, a
    /// format error for malformed `srcopts` or `specialsrcs` entries, or
    /// any failure from included files and source dispatch.
    pub fn generic_parse(
        &mut self,
        ops: &mut GlobalOps,
        realsrcdir: &str,
        args: &ArgMap,
        extra: &[&str],
    ) -> Result<()> {
        let is_link = self.kind.link().is_some();
        let linker_params: Vec<String> = ops.registry.linker_params.keys().cloned().collect();
        let mut unhandled: BTreeSet<&str> = args
            .keys()
            .map(String::as_str)
            .filter(|key| !extra.contains(key))
            .filter(|key| !(is_link && (LINK_KEYS.contains(key) || linker_params.iter().any(|p| p == key))))
            .collect();

        for inc in args.get("INCLUDE").into_iter().flatten() {
            self.parse_include(ops, realsrcdir, inc)?;
        }
        unhandled.remove("INCLUDE");

        let srcdir = args
            .get("srcdir")
            .and_then(|dirs| dirs.first())
            .map_or_else(|| realsrcdir.to_owned(), |dir| paths::normalize(realsrcdir, dir));
        unhandled.remove("srcdir");
        self.general.srcdir.clone_from(&srcdir);

        if let Some(destdir) = args.get("destdir").and_then(|dirs| dirs.first()) {
            self.general.destdir.clone_from(destdir);
        }
        unhandled.remove("destdir");

        for ev in args.get("extravars").into_iter().flatten() {
            self.general.extravars.push(paths::join([realsrcdir, ev.as_str()]));
        }
        unhandled.remove("extravars");

        for bv in &ops.config.buildvars {
            self.general
                .buildvars
                .entry(bv.clone())
                .or_default()
                .extend(args.get(bv).into_iter().flatten().cloned());
            unhandled.remove(bv.as_str());
        }

        self.general
            .collect_target_var
            .extend(args.get("collect_target_var").into_iter().flatten().cloned());
        unhandled.remove("collect_target_var");

        for (key, handler) in ops.registry.general_params.clone() {
            if let Some(values) = args.get(&key).filter(|v| !v.is_empty()) {
                handler(&mut self.general, values)?;
            }
            unhandled.remove(key.as_str());
        }

        for dep in args.get("deps").into_iter().flatten() {
            match dep.split_once(':') {
                Some((target, source)) => self
                    .general
                    .deps
                    .entry(target.to_owned())
                    .or_default()
                    .push(source.to_owned()),
                None => self.general.gendeps.push(dep.clone()),
            }
        }
        unhandled.remove("deps");

        for srcopt in args.get("srcopts").into_iter().flatten() {
            let Some((src, opt)) = srcopt.split_once(':') else {
                return Err(self.error(ParseErrorKind::BadSrcopts, srcopt).into());
            };
            self.general
                .srcopts
                .entry(src.to_owned())
                .or_default()
                .push(opt.to_owned());
        }
        unhandled.remove("srcopts");

        for spsrc in args.get("specialsrcs").into_iter().flatten() {
            let fields: Vec<&str> = spsrc.splitn(4, ':').collect();
            let [rule, srcs, target, rest @ ..] = fields.as_slice() else {
                return Err(self.error(ParseErrorKind::BadSpecialSrcs, spsrc).into());
            };
            let patterns: Vec<String> = srcs.split(',').map(str::to_owned).collect();
            let special = SpecialSrc {
                target: (*target).to_owned(),
                rule: (*rule).to_owned(),
                sources: ops.glob_dir(&srcdir, &patterns),
                destdir: "obj".to_owned(),
                srcdir: realsrcdir.to_owned(),
                extraargs: rest
                    .first()
                    .map(|extra| extra.split(',').map(str::to_owned).collect())
                    .unwrap_or_default(),
                options: TargetOptions::new(),
            };
            self.compile_special(ops, special)?;
        }
        unhandled.remove("specialsrcs");

        if let Some(patterns) = args.get("srcs") {
            for src in ops.glob_dir(&srcdir, patterns) {
                self.compile_src(&ops.registry, &srcdir, &src)?;
            }
        }
        unhandled.remove("srcs");

        if unhandled.is_empty() {
            Ok(())
        } else {
            let keys: Vec<&str> = unhandled.into_iter().collect();
            Err(self.error(ParseErrorKind::UnknownArgument, &keys.join(", ")).into())
        }
    }

    /// Parse a bare argument file as if its arguments were given here.
    fn parse_include(&mut self, ops: &mut GlobalOps, realsrcdir: &str, inc: &str) -> Result<()> {
        let file = paths::normalize(realsrcdir, inc);
        let text = ops.open_builddesc(&file)?;
        let mut scanner = Scanner::new(&text, file.clone());
        let ParsedArgs { args: included, .. } = Args::parse(&mut scanner, ops.cond_eval())?;
        let parent = std::mem::replace(&mut self.general.builddesc, file.clone());
        let incdir = paths::dir(&file);
        let base = if incdir == "." { "" } else { incdir.as_str() };
        let outcome = self.parse(ops, base, &included.unflavored);
        self.general.builddesc = parent;
        outcome
    }

    fn error(&self, kind: ParseErrorKind, token: &str) -> ParseError {
        ParseError::new(kind, token, self.general.builddesc.clone())
    }

    /// Add the final targets, record collected variables and run hooks.
    ///
    /// # Errors
    ///
    /// Fails on target collisions or hook failures.
    pub fn finalize(&mut self, ops: &mut GlobalOps) -> Result<()> {
        if let DescriptorKind::Custom(custom) = &self.kind {
            let behaviour = Arc::clone(custom);
            behaviour.finalize(self, ops)?;
        } else {
            self.finalize_kind(ops)?;
        }
        self.general.collect(&mut ops.collected_vars);
        for hook in self.finalize_hooks.clone() {
            hook.finalize(self, ops)?;
        }
        Ok(())
    }

    fn finalize_kind(&mut self, ops: &mut GlobalOps) -> Result<()> {
        let general = &mut self.general;
        match &mut self.kind {
            DescriptorKind::General | DescriptorKind::Custom(_) => Ok(()),
            DescriptorKind::Prog(link) => link.finalize_prog(general, ops),
            DescriptorKind::Lib(lib) => lib.finalize(general, ops),
            DescriptorKind::Module(link) => link.finalize_module(general, ops),
            DescriptorKind::Go(go) => go.finalize(general, ops),
            DescriptorKind::Install(install) => install.finalize(general),
        }
    }

    /// Implicit dependencies of `tname`, including linked libraries when
    /// the target asks for them.
    #[must_use]
    pub fn resolve_deps(&self, ops: &GlobalOps, tname: &str) -> Vec<String> {
        let mut deps = self.general.resolve_deps(ops, tname);
        if let (Some(link), Some(target)) = (self.kind.link(), self.general.targets.get(tname)) {
            if target.has(TargetOption::Libdeps) {
                deps.extend(ops.libs.our_static(&link.libs));
            }
            if target.has(TargetOption::Piclibdeps) {
                deps.extend(ops.libs.our_pic(&link.libs));
            }
        }
        deps
    }

    /// Order-only dependencies of `target`.
    #[must_use]
    pub fn resolve_order_deps(&self, target: &Target) -> Vec<String> {
        match self.kind.link() {
            Some(link) if target.has(TargetOption::Incdeps) => link
                .incdeps_generated
                .iter()
                .filter(|dep| !target.incdeps_except.contains(*dep))
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }
}
