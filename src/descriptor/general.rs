//! State shared by every descriptor kind.

use super::target::{Target, TargetOption, TargetOptions};
use crate::error::{ParseError, ParseErrorKind};
use crate::ops::GlobalOps;
use crate::paths;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Prefix given to a target displaced by an install target of the same name.
const RENAMED_PREFIX: &str = "TMP_BUILD";

/// Base record of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralDesc {
    /// Destination alias for the main target.
    pub destdir: String,
    /// Options for the main target.
    pub target_options: TargetOptions,
    /// Source directory, possibly overridden by `srcdir[...]`.
    pub srcdir: String,
    /// Description file this descriptor came from.
    pub builddesc: String,
    /// First token of the directive.
    pub target_name: String,
    /// Flavors this descriptor is emitted for; empty means all.
    pub only_for_flavors: Vec<String>,
    /// Targets by name.
    pub targets: BTreeMap<String, Target>,
    /// Secondary output name to the target that produces it.
    pub aliases: BTreeMap<String, String>,
    /// Source name to the directory it was first seen in.
    pub srcdirs: BTreeMap<String, String>,
    /// Target name to extra dependencies from `deps[target:dep]`.
    pub deps: BTreeMap<String, Vec<String>>,
    /// Source name to options from `srcopts[src:opt]`.
    pub srcopts: BTreeMap<String, Vec<String>>,
    /// Dependencies of every target.
    pub gendeps: Vec<String>,
    /// Collected variables receiving every `all` target.
    pub collect_target_var: Vec<String>,
    /// Files included at the top of the descriptor's Ninja file.
    pub extravars: Vec<String>,
    /// Exported variables from the configured `buildvars` keys.
    pub buildvars: BTreeMap<String, Vec<String>>,
}

impl GeneralDesc {
    /// Fresh copy of a template, stamped with its origin.
    #[must_use]
    pub fn instantiate(&self, builddesc: &str, target_name: &str, flavors: Vec<String>) -> Self {
        Self {
            destdir: self.destdir.clone(),
            target_options: self.target_options.clone(),
            builddesc: builddesc.to_owned(),
            target_name: target_name.to_owned(),
            only_for_flavors: flavors,
            ..Self::default()
        }
    }

    /// Template with a default destination and main-target options.
    #[must_use]
    pub fn template<I>(destdir: &str, options: I) -> Self
    where
        I: IntoIterator<Item = TargetOption>,
    {
        Self {
            destdir: destdir.to_owned(),
            target_options: options.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Add a target and return it for further adjustment.
    ///
    /// A second definition of `name` is accepted only when one of the two
    /// uses an `install*` rule: the non-install target is renamed to
    /// `TMP_BUILD<name>` so `name` always refers to the installed file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::MultipleDefinedTarget`] when neither
    /// definition installs, or when a renamed target already exists.
    pub fn add_target(
        &mut self,
        name: &str,
        rule: &str,
        mut sources: Vec<String>,
        destdir: &str,
        srcdir: &str,
    ) -> Result<&mut Target, ParseError> {
        let srcopts: Vec<String> = sources
            .iter()
            .filter_map(|src| self.srcopts.get(src))
            .flatten()
            .cloned()
            .collect();

        let mut tname = name.to_owned();
        if let Some(existing_rule) = self.targets.get(name).map(|t| t.rule.clone()) {
            let renamed = format!("{RENAMED_PREFIX}{name}");
            if self.targets.contains_key(&renamed) {
                return Err(self.multiple_defined(name));
            }
            if rule.starts_with("install") {
                for src in sources.iter_mut().filter(|src| src.as_str() == name) {
                    src.clone_from(&renamed);
                }
                self.rename(name, &renamed);
            } else if existing_rule.starts_with("install") {
                if let Some(existing) = self.targets.get_mut(name) {
                    for src in existing.sources.iter_mut().filter(|src| src.as_str() == name) {
                        src.clone_from(&renamed);
                    }
                }
                tname = renamed;
            } else {
                return Err(self.multiple_defined(name));
            }
        }

        for src in &sources {
            self.srcdirs.insert(src.clone(), srcdir.to_owned());
        }
        let target = Target {
            rule: rule.to_owned(),
            sources,
            srcopts,
            destdir: destdir.to_owned(),
            ..Target::default()
        };
        Ok(match self.targets.entry(tname) {
            Entry::Vacant(slot) => slot.insert(target),
            Entry::Occupied(slot) => {
                let existing = slot.into_mut();
                *existing = target;
                existing
            }
        })
    }

    fn multiple_defined(&self, name: &str) -> ParseError {
        ParseError::new(ParseErrorKind::MultipleDefinedTarget, name, self.builddesc.clone())
    }

    fn rename(&mut self, from: &str, to: &str) {
        if let Some(target) = self.targets.remove(from) {
            self.targets.insert(to.to_owned(), target);
        }
        if let Some(dir) = self.srcdirs.remove(from) {
            self.srcdirs.insert(to.to_owned(), dir);
        }
        if let Some(deps) = self.deps.remove(from) {
            self.deps.insert(to.to_owned(), deps);
        }
        if let Some(opts) = self.srcopts.remove(from) {
            self.srcopts.insert(to.to_owned(), opts);
        }
    }

    /// Mark `primary` as producing every file in `names`.
    pub fn add_multi_target(&mut self, names: Vec<String>, primary: &str) {
        for name in names.iter().filter(|n| *n != primary) {
            self.aliases.insert(name.clone(), primary.to_owned());
        }
        if let Some(target) = self.targets.get_mut(primary) {
            target.multi_target = names;
        }
    }

    /// Target producing `name`, directly or as a secondary output.
    #[must_use]
    pub fn find_target(&self, name: &str) -> Option<&Target> {
        self.targets
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|primary| self.targets.get(primary)))
    }

    /// Directory a source reference resolves against.
    ///
    /// Absolute paths and variables resolve to nothing; sources produced by
    /// another target of this descriptor resolve to that target's
    /// destination; anything else to where the source was first seen.
    #[must_use]
    pub fn resolve_srcdir(&self, src: &str, tname: &str) -> String {
        if src.starts_with(['/', '$']) {
            return String::new();
        }
        match self.find_target(src) {
            Some(target) if src != tname => target.resolve_dest(),
            _ => self.srcdirs.get(src).cloned().unwrap_or_default(),
        }
    }

    /// Resolve source references of `tname` into Ninja paths.
    #[must_use]
    pub fn resolve_srcs(&self, ops: &GlobalOps, tname: &str, srcs: &[String]) -> Vec<String> {
        srcs.iter()
            .map(|src| {
                let resolved = ops.resolve_collected_var(src);
                paths::join([self.resolve_srcdir(&resolved, tname).as_str(), resolved.as_str()])
            })
            .collect()
    }

    /// Implicit dependencies of `tname`.
    ///
    /// In order: `deps[tname:...]`, the target's own dependencies, global
    /// dependencies other than `tname` itself, dependencies declared for
    /// each of its sources and finally the rule dependencies from `CONFIG`.
    #[must_use]
    pub fn resolve_deps(&self, ops: &GlobalOps, tname: &str) -> Vec<String> {
        let Some(target) = self.targets.get(tname) else {
            return Vec::new();
        };
        let mut resolved = self.resolve_srcs(ops, tname, self.deps_of(tname));
        resolved.extend(self.resolve_srcs(ops, tname, &target.deps));

        let mut gendeps = self.gendeps.clone();
        if let Some(idx) = gendeps.iter().position(|dep| dep == tname) {
            gendeps.remove(idx);
        }
        resolved.extend(self.resolve_srcs(ops, tname, &gendeps));

        for src in &target.sources {
            resolved.extend(self.resolve_srcs(ops, src, self.deps_of(src)));
        }
        if let Some(ruledeps) = ops.config.ruledeps.get(&target.rule) {
            resolved.extend(ruledeps.iter().cloned());
        }
        resolved
    }

    fn deps_of(&self, name: &str) -> &[String] {
        self.deps.get(name).map_or(&[], Vec::as_slice)
    }

    /// Record targets in collected variables.
    ///
    /// Target names are visited in sorted order so the variables are
    /// stable between runs.
    pub fn collect(&self, collected: &mut BTreeMap<String, Vec<String>>) {
        for var in &self.collect_target_var {
            for (tname, target) in self.targets.iter().filter(|(_, t)| t.has(TargetOption::All)) {
                collected
                    .entry(var.clone())
                    .or_default()
                    .push(paths::join([target.resolve_dest().as_str(), tname.as_str()]));
            }
        }
        for (tname, target) in &self.targets {
            if let Some(var) = &target.collect_as {
                collected
                    .entry(var.clone())
                    .or_default()
                    .push(paths::join([target.resolve_dest().as_str(), tname.as_str()]));
            }
        }
    }

    /// Object directory relative to the flavor build directory.
    #[must_use]
    pub fn default_object_dir(&self) -> String {
        paths::join([self.srcdir.as_str(), self.target_name.as_str()])
    }

    /// Whether this descriptor is emitted for `flavor`.
    #[must_use]
    pub fn valid_for_flavor(&self, flavor: &str) -> bool {
        self.only_for_flavors.is_empty() || self.only_for_flavors.iter().any(|f| f == flavor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn install_displaces_earlier_target() {
        let mut desc = GeneralDesc::default();
        desc.add_target("foo", "in", owned(&["foo.in"]), "obj", "src").expect("first");
        desc.add_target("foo", "install_conf", owned(&["foo"]), "conf", "src")
            .expect("install");
        let installed = desc.targets.get("foo").expect("installed");
        assert_eq!(installed.rule, "install_conf");
        assert_eq!(installed.sources, ["TMP_BUILDfoo"]);
        assert_eq!(desc.targets.get("TMP_BUILDfoo").map(|t| t.rule.as_str()), Some("in"));
    }

    #[test]
    fn later_target_yields_to_install() {
        let mut desc = GeneralDesc::default();
        desc.add_target("foo", "install_script", owned(&["foo"]), "bin", "src")
            .expect("install");
        desc.add_target("foo", "in", owned(&["foo.in"]), "obj", "src").expect("generator");
        assert_eq!(desc.targets["foo"].sources, ["TMP_BUILDfoo"]);
        assert_eq!(desc.targets["TMP_BUILDfoo"].rule, "in");
    }

    #[test]
    fn two_plain_targets_collide() {
        let mut desc = GeneralDesc {
            builddesc: "lib/Builddesc".to_owned(),
            ..GeneralDesc::default()
        };
        desc.add_target("a.o", "cc", owned(&["a.c"]), "obj", "").expect("first");
        let err = desc
            .add_target("a.o", "cxx", owned(&["a.cc"]), "obj", "")
            .expect_err("collision");
        assert_eq!(err.kind, ParseErrorKind::MultipleDefinedTarget);
        assert_eq!(err.builddesc, "lib/Builddesc");
    }

    #[test]
    fn srcopts_follow_sources() {
        let mut desc = GeneralDesc::default();
        desc.srcopts.insert("a.c".to_owned(), owned(&["-O0"]));
        let target = desc.add_target("a.o", "cc", owned(&["a.c"]), "obj", "").expect("add");
        assert_eq!(target.srcopts, ["-O0"]);
    }

    #[test]
    fn generated_sources_resolve_to_their_destination() {
        let mut desc = GeneralDesc::default();
        desc.add_target("x.c", "in", owned(&["x.c.in"]), "obj", "lib").expect("gen");
        desc.add_target("x.o", "cc", owned(&["x.c"]), "obj", "lib").expect("obj");
        assert_eq!(desc.resolve_srcdir("x.c", "x.o"), "$objdir");
        assert_eq!(desc.resolve_srcdir("x.c.in", "x.c"), "lib");
        assert_eq!(desc.resolve_srcdir("$libdir/y", "x.o"), "");
    }

    #[test]
    fn aliases_resolve_to_primary_destination() {
        let mut desc = GeneralDesc::default();
        desc.add_target("a.h", "gen", owned(&["a.def"]), "obj", "").expect("add");
        desc.add_multi_target(owned(&["a.h", "a.c"]), "a.h");
        assert_eq!(desc.resolve_srcdir("a.c", "a.o"), "$objdir");
        assert_eq!(desc.targets["a.h"].multi_target, ["a.h", "a.c"]);
    }
}
