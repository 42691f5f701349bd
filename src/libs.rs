//! Library registry and link-order resolution.
//!
//! Libraries register themselves by name while their descriptor is parsed.
//! Resolution walks the dependency lists depth first, so every library
//! appears after the libraries it depends on; the linker views then reverse
//! that order so dependents come first on the command line.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// What a library descriptor exposes to its dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibInfo {
    /// Library name, the descriptor's target name.
    pub name: String,
    /// Libraries this one links against.
    pub deps: Vec<String>,
    /// Registered without objects; only propagates include dependencies.
    pub dummy: bool,
    /// Built as one pre-linked object instead of an archive.
    pub link_set: bool,
    /// Link rule required by the library's sources.
    pub link: String,
}

/// A library reference on a link line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRef {
    /// An object file below `$libdir`.
    Object(String),
    /// A linker flag such as `-lfoo`.
    Flag(String),
}

impl LibInfo {
    /// File name of the static form.
    #[must_use]
    pub fn lib_name(&self) -> String {
        if self.link_set {
            format!("lib{}.o", self.name)
        } else {
            format!("lib{}.a", self.name)
        }
    }

    /// File name of the position-independent form.
    #[must_use]
    pub fn piclib_name(&self) -> String {
        if self.link_set {
            format!("lib{}_pic.o", self.name)
        } else {
            format!("lib{}_pic.a", self.name)
        }
    }

    /// How to reference the static form when linking.
    #[must_use]
    pub fn name_as_lib(&self) -> LinkRef {
        if self.link_set {
            LinkRef::Object(self.lib_name())
        } else {
            LinkRef::Flag(format!("-l{}", self.name))
        }
    }

    /// How to reference the position-independent form when linking.
    #[must_use]
    pub fn name_as_piclib(&self) -> LinkRef {
        if self.link_set {
            LinkRef::Object(self.piclib_name())
        } else {
            LinkRef::Flag(format!("-l{}_pic", self.name))
        }
    }
}

/// Name-keyed registry of libraries built by this tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibRegistry {
    libs: BTreeMap<String, LibInfo>,
}

impl LibRegistry {
    /// Register or replace a library.
    pub fn register(&mut self, info: LibInfo) {
        debug!(library = %info.name, dummy = info.dummy, "registering library");
        self.libs.insert(info.name.clone(), info);
    }

    /// Look a library up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LibInfo> {
        self.libs.get(name)
    }

    /// Whether `name` is built by this tree.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.libs.contains_key(name)
    }

    /// Order `libs` and their transitive dependencies, dependencies first.
    ///
    /// Each name appears once. Names not in the registry are kept as
    /// external libraries. Cycles are broken at the first repeated name.
    ///
    /// # Examples
    ///
    /// ```
    /// use builddesc::libs::{LibInfo, LibRegistry};
    /// let mut reg = LibRegistry::default();
    /// reg.register(LibInfo { name: "a".into(), deps: vec!["b".into()], ..LibInfo::default() });
    /// reg.register(LibInfo { name: "b".into(), deps: vec!["m".into()], ..LibInfo::default() });
    /// assert_eq!(reg.resolve(&["a".to_owned()]), ["m", "b", "a"]);
    /// ```
    #[must_use]
    pub fn resolve(&self, libs: &[String]) -> Vec<String> {
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        let mut active = BTreeSet::new();
        self.visit(libs, &mut visited, &mut active, &mut order);
        order
    }

    fn visit<'a>(
        &'a self,
        libs: &'a [String],
        visited: &mut BTreeSet<&'a str>,
        active: &mut BTreeSet<&'a str>,
        order: &mut Vec<String>,
    ) {
        for lib in libs {
            if !visited.insert(lib.as_str()) {
                if active.contains(lib.as_str()) {
                    debug!(library = %lib, "library dependency cycle");
                }
                continue;
            }
            if let Some(info) = self.libs.get(lib) {
                active.insert(lib.as_str());
                self.visit(&info.deps, visited, active, order);
                active.remove(lib.as_str());
            }
            order.push(lib.clone());
        }
    }

    /// Non-dummy libraries we build, dependents first.
    #[must_use]
    pub fn ours(&self, libs: &[String]) -> Vec<&LibInfo> {
        self.resolve(libs)
            .iter()
            .rev()
            .filter_map(|name| self.libs.get(name))
            .filter(|info| !info.dummy)
            .collect()
    }

    /// External libraries, dependents first, as linker arguments.
    ///
    /// Names containing `/` or `$` are taken to be paths and kept as is.
    #[must_use]
    pub fn external(&self, libs: &[String]) -> Vec<String> {
        self.resolve(libs)
            .into_iter()
            .rev()
            .filter(|name| !self.libs.contains_key(name))
            .map(|name| {
                if name.contains(['/', '$']) {
                    name
                } else {
                    format!("-l{name}")
                }
            })
            .collect()
    }

    /// Static library paths of our libraries.
    #[must_use]
    pub fn our_static(&self, libs: &[String]) -> Vec<String> {
        self.ours(libs)
            .into_iter()
            .map(|info| format!("$libdir/{}", info.lib_name()))
            .collect()
    }

    /// Position-independent library paths of our libraries.
    #[must_use]
    pub fn our_pic(&self, libs: &[String]) -> Vec<String> {
        self.ours(libs)
            .into_iter()
            .map(|info| format!("$libdir/{}", info.piclib_name()))
            .collect()
    }

    /// Our static libraries split into link-set objects and `-l` flags.
    #[must_use]
    pub fn our_static_as_lib(&self, libs: &[String]) -> (Vec<String>, Vec<String>) {
        split_refs(self.ours(libs).into_iter().map(LibInfo::name_as_lib))
    }

    /// Our position-independent libraries split into objects and flags.
    #[must_use]
    pub fn our_pic_as_lib(&self, libs: &[String]) -> (Vec<String>, Vec<String>) {
        split_refs(self.ours(libs).into_iter().map(LibInfo::name_as_piclib))
    }

    /// Link rule for a target using `link` that links against `libs`.
    ///
    /// Linking any of our libraries that needs the C++ linker upgrades the
    /// rule to `linkxx`.
    #[must_use]
    pub fn linker(&self, link: &str, libs: &[String]) -> String {
        if self.ours(libs).iter().any(|info| info.link == "linkxx") {
            "linkxx".to_owned()
        } else {
            link.to_owned()
        }
    }
}

fn split_refs(refs: impl Iterator<Item = LinkRef>) -> (Vec<String>, Vec<String>) {
    let mut objs = Vec::new();
    let mut flags = Vec::new();
    for link_ref in refs {
        match link_ref {
            LinkRef::Object(name) => objs.push(format!("$libdir/{name}")),
            LinkRef::Flag(flag) => flags.push(flag),
        }
    }
    (objs, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn lib(name: &str, deps: &[&str]) -> LibInfo {
        LibInfo {
            name: name.to_owned(),
            deps: deps.iter().map(|d| (*d).to_owned()).collect(),
            link: "link".to_owned(),
            ..LibInfo::default()
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[fixture]
    fn chain() -> LibRegistry {
        let mut reg = LibRegistry::default();
        reg.register(lib("A", &["B"]));
        reg.register(lib("B", &["C"]));
        reg.register(lib("C", &[]));
        reg
    }

    #[rstest]
    #[case(&["A"], &["C", "B", "A"])]
    #[case(&["A", "C"], &["C", "B", "A"])]
    #[case(&["C", "A"], &["C", "B", "A"])]
    #[case(&["m", "B"], &["m", "C", "B"])]
    fn resolves_dependencies_first(chain: LibRegistry, #[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(chain.resolve(&names(input)), names(expected));
    }

    #[test]
    fn cycles_terminate() {
        let mut reg = LibRegistry::default();
        reg.register(lib("x", &["y"]));
        reg.register(lib("y", &["x"]));
        assert_eq!(reg.resolve(&names(&["x"])), ["y", "x"]);
    }

    #[rstest]
    fn dummy_libraries_are_not_linked(mut chain: LibRegistry) {
        let mut dummy = lib("B", &["C"]);
        dummy.dummy = true;
        chain.register(dummy);
        assert_eq!(
            chain.our_static(&names(&["A"])),
            ["$libdir/libA.a", "$libdir/libC.a"]
        );
    }

    #[test]
    fn external_libraries_become_flags_unless_paths() {
        let mut reg = LibRegistry::default();
        reg.register(lib("ours", &["z", "$libdir/x.a"]));
        assert_eq!(
            reg.external(&names(&["ours", "m"])),
            ["-lm", "$libdir/x.a", "-lz"]
        );
    }

    #[test]
    fn link_sets_are_objects() {
        let mut reg = LibRegistry::default();
        let mut set = lib("set", &[]);
        set.link_set = true;
        reg.register(set);
        reg.register(lib("arch", &["set"]));
        let (objs, flags) = reg.our_pic_as_lib(&names(&["arch"]));
        assert_eq!(objs, ["$libdir/libset_pic.o"]);
        assert_eq!(flags, ["-larch_pic"]);
    }

    #[test]
    fn cxx_library_upgrades_linker() {
        let mut reg = LibRegistry::default();
        let mut cxx = lib("cxx", &[]);
        cxx.link = "linkxx".to_owned();
        reg.register(cxx);
        assert_eq!(reg.linker("link", &names(&["cxx"])), "linkxx");
        assert_eq!(reg.linker("link", &names(&["m"])), "link");
    }
}
