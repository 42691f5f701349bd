//! State and finalize steps shared by descriptors that link objects.

use super::general::GeneralDesc;
use super::target::TargetOption;
use crate::args::ArgMap;
use crate::compiler::VersionCheck;
use crate::error::Result;
use crate::ops::{Analyser, GlobalOps};
use crate::paths;
use crate::registry::Registry;
use std::collections::BTreeSet;

/// Argument keys consumed by every linking descriptor.
pub const LINK_KEYS: [&str; 3] = ["incdirs", "no_analyse", "libs"];

/// How managed-runtime sources are linked into the enclosing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoLinkMode {
    /// Static archive for programs.
    Static,
    /// Position-independent archive for loadable modules.
    Pic,
}

impl GoLinkMode {
    const fn gomode(self) -> &'static str {
        match self {
            Self::Static => "lib",
            Self::Pic => "piclib",
        }
    }
}

/// Link record carried by programs, libraries and modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDesc {
    /// Also build position-independent objects.
    pub picrules: bool,
    /// Link rule; switched to `linkxx` by C++ sources.
    pub link: String,
    /// Include directories, kept sorted.
    pub incdirs: BTreeSet<String>,
    /// Object base names.
    pub objs: Vec<String>,
    /// Library references.
    pub libs: Vec<String>,
    /// Headers installed into the include directory.
    pub includes: Vec<String>,
    /// Generated headers compiled objects wait for.
    pub incdeps: Vec<String>,
    /// Managed-runtime sources copied into the object directory.
    pub go_srcs: Vec<String>,
    /// Skip analysis targets for sources compiled from now on.
    pub no_analyse: bool,
    /// Object base names excluded from analysis.
    pub dont_analyse: BTreeSet<String>,
    /// Resolved order-only dependencies of `incdeps` targets.
    pub incdeps_generated: Vec<String>,
}

impl LinkDesc {
    /// Template with a link rule and pic setting.
    #[must_use]
    pub fn template(link: &str, picrules: bool) -> Self {
        Self {
            picrules,
            link: link.to_owned(),
            ..Self::default()
        }
    }

    /// Fresh copy of a template.
    #[must_use]
    pub fn instantiate(&self) -> Self {
        Self::template(&self.link, self.picrules)
    }

    /// Consume the linking keys of `args`.
    ///
    /// The source directory is always an include directory.
    ///
    /// # Errors
    ///
    /// Propagates failures of plugin linker parameters.
    pub fn parse_args(&mut self, registry: &Registry, srcdir: &str, args: &ArgMap) -> Result<()> {
        if !srcdir.is_empty() {
            self.incdirs.insert(srcdir.to_owned());
        }
        for inc in args.get("incdirs").into_iter().flatten() {
            let dir = paths::normalize(srcdir, inc);
            if !dir.is_empty() {
                self.incdirs.insert(dir);
            }
        }
        if args.contains_key("no_analyse") {
            self.no_analyse = true;
        }
        self.libs.extend(args.get("libs").into_iter().flatten().cloned());
        for (key, handler) in &registry.linker_params {
            if let Some(values) = args.get(key).filter(|v| !v.is_empty()) {
                handler(self, values)?;
            }
        }
        Ok(())
    }

    /// `base + suffix` for every object passing `keep`.
    #[must_use]
    pub fn suffixed_objs(&self, suffix: &str, keep: impl Fn(&str) -> bool) -> Vec<String> {
        self.objs
            .iter()
            .filter(|base| keep(base))
            .map(|base| format!("{base}{suffix}"))
            .collect()
    }

    /// Include markers of the libraries we build and link against.
    #[must_use]
    pub fn resolve_incdeps(&self, ops: &GlobalOps) -> Vec<String> {
        self.libs
            .iter()
            .filter(|lib| ops.libs.contains(lib))
            .map(|lib| format!("$builddir/depend_includes_{lib}"))
            .collect()
    }

    /// Collect the order-only dependencies of compiled objects.
    pub fn finalize_incdeps(&mut self, g: &GeneralDesc, ops: &GlobalOps) {
        let tname = g.target_name.as_str();
        self.incdeps_generated.extend(self.resolve_incdeps(ops));
        self.incdeps_generated
            .extend(g.resolve_srcs(ops, tname, &self.incdeps));
        if g.target_options.contains(&TargetOption::Lib) {
            self.incdeps_generated
                .push(format!("$builddir/depend_includes_{tname}"));
        }
    }

    /// Finalize compiled objects and schedule compiler detection.
    pub fn finalize_cc(&mut self, g: &GeneralDesc, ops: &mut GlobalOps) {
        if !self.objs.is_empty() {
            self.finalize_incdeps(g, ops);
            ops.version_checks.insert(VersionCheck::Cc);
        }
    }

    /// Add the analysis aggregate and register it for the flavor edge.
    ///
    /// # Errors
    ///
    /// Fails if the aggregate name collides with another target.
    pub fn finalize_analyse(&self, g: &mut GeneralDesc, ops: &mut GlobalOps) -> Result<()> {
        let objs = self.suffixed_objs(".analyse", |base| !self.dont_analyse.contains(base));
        if objs.is_empty() {
            return Ok(());
        }
        let name = format!("{}.target_analyze", g.target_name);
        g.add_target(&name, "copy_analyse", objs, "obj", "")?;
        ops.analyses.push(Analyser {
            target_name: paths::join([g.srcdir.as_str(), g.target_name.as_str(), name.as_str()]),
            only_for_flavors: g.only_for_flavors.clone(),
        });
        Ok(())
    }

    /// Build the managed-runtime archive and return it as a link input.
    ///
    /// # Errors
    ///
    /// Fails if a generated name collides with another target.
    pub fn finalize_go_srcs(
        &mut self,
        g: &mut GeneralDesc,
        ops: &GlobalOps,
        mode: GoLinkMode,
    ) -> Result<Vec<String>> {
        if self.go_srcs.is_empty() {
            return Ok(Vec::new());
        }
        g.add_target("go/main.go", "goaddmain", vec!["$buildtooldir/main.go".to_owned()], "objdir", "")?;
        g.add_target("go", "phony", vec!["go/main.go".to_owned()], "objdir", "")?;

        let ldlibs = self.ldlibs_as_lib(ops, mode);
        let lib_option = match mode {
            GoLinkMode::Static => TargetOption::Libdeps,
            GoLinkMode::Pic => TargetOption::Piclibdeps,
        };

        let archive = g.add_target("gosrc.a", "gobuildlib", vec!["$objdir/go".to_owned()], "objdir", "")?;
        archive
            .with_args([
                "depfile=$objdir/go/depfile".to_owned(),
                format!("gomode={}", mode.gomode()),
                format!("ldlibs={ldlibs}"),
            ])
            .with_options([TargetOption::Incdeps, lib_option]);
        archive.deps.extend(self.go_srcs.iter().cloned());
        archive.incdeps_except.insert("$objdir/gosrc.h".to_owned());

        g.add_target("gosrc.h", "phony", vec!["$objdir/gosrc.a".to_owned()], "objdir", "")?;
        self.incdeps_generated.push("$objdir/gosrc.h".to_owned());
        Ok(vec!["$objdir/gosrc.a".to_owned()])
    }

    /// `ldlibs` value linking our libraries by name plus external ones.
    #[must_use]
    pub fn ldlibs_as_lib(&self, ops: &GlobalOps, mode: GoLinkMode) -> String {
        let (mut refs, flags) = match mode {
            GoLinkMode::Static => ops.libs.our_static_as_lib(&self.libs),
            GoLinkMode::Pic => ops.libs.our_pic_as_lib(&self.libs),
        };
        refs.extend(flags);
        refs.extend(ops.libs.external(&self.libs));
        refs.join(" ")
    }

    /// `-I` flags for the descriptor's Ninja header.
    #[must_use]
    pub fn includes_line(&self) -> Option<String> {
        if self.objs.is_empty() {
            return None;
        }
        let mut line = "includes =".to_owned();
        for dir in &self.incdirs {
            line.push_str(" -I ");
            line.push_str(dir);
        }
        line.push_str(" -I $objdir");
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LinkerParam;
    use std::sync::Arc;

    fn args(pairs: &[(&str, &[&str])]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, vs)| ((*k).to_owned(), vs.iter().map(|v| (*v).to_owned()).collect()))
            .collect()
    }

    #[test]
    fn include_dirs_are_sorted_and_normalised() {
        let mut link = LinkDesc::default();
        let parsed = args(&[("incdirs", &["./gen", "common/inc", "lib/foo"])]);
        link.parse_args(&Registry::default(), "lib/foo", &parsed)
            .expect("parse");
        assert_eq!(
            link.incdirs.iter().collect::<Vec<_>>(),
            ["common/inc", "lib/foo", "lib/foo/gen"]
        );
    }

    #[test]
    fn empty_no_analyse_still_counts() {
        let mut link = LinkDesc::default();
        link.parse_args(&Registry::default(), "", &args(&[("no_analyse", &[])]))
            .expect("parse");
        assert!(link.no_analyse);
        assert!(link.incdirs.is_empty());
    }

    #[test]
    fn plugin_linker_params_see_their_values() {
        let mut registry = Registry::default();
        let handler: LinkerParam = Arc::new(|link: &mut LinkDesc, values: &[String]| {
            link.libs.extend(values.iter().map(|v| format!("ext_{v}")));
            Ok(())
        });
        registry.linker_params.insert("extlibs".to_owned(), handler);
        let mut link = LinkDesc::default();
        link.parse_args(&registry, "", &args(&[("extlibs", &["z"]), ("libs", &["m"])]))
            .expect("parse");
        assert_eq!(link.libs, ["m", "ext_z"]);
    }

    #[test]
    fn includes_line_lists_dirs_then_objdir() {
        let mut link = LinkDesc::default();
        assert_eq!(link.includes_line(), None);
        link.objs.push("main".to_owned());
        link.incdirs.insert("src".to_owned());
        assert_eq!(link.includes_line().as_deref(), Some("includes = -I src -I $objdir"));
    }

    #[test]
    fn suffixed_objs_honour_filter() {
        let link = LinkDesc {
            objs: vec!["a".to_owned(), "b".to_owned()],
            dont_analyse: BTreeSet::from(["b".to_owned()]),
            ..LinkDesc::default()
        };
        assert_eq!(
            link.suffixed_objs(".analyse", |base| !link.dont_analyse.contains(base)),
            ["a.analyse"]
        );
        assert_eq!(link.suffixed_objs(".o", |_| true), ["a.o", "b.o"]);
    }
}
