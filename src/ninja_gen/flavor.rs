//! Per-flavor `build.ninja` and `buildvars.ninja`.

use super::descriptor::DescriptorFile;
use super::{Output, Renderer, write_list};
use crate::config::FlavorConfig;
use crate::paths;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

struct FlavorFile<'a> {
    r: &'a Renderer<'a>,
    flavor: &'a str,
    builddir: String,
    config: Option<&'a FlavorConfig>,
    subninjas: &'a BTreeSet<String>,
    defaults: Vec<String>,
}

impl Display for FlavorFile<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ops = self.r.ops;
        let config = &ops.config;
        writeln!(f, "buildvars={}/buildvars.ninja", self.builddir)?;
        writeln!(f, "include $buildvars")?;
        if let Some(path) = self.r.rule_file(&config.flavor_rule_dir, self.flavor) {
            writeln!(f, "include {path}")?;
        }
        let compiler_flavor = format!("{}-{}", ops.compiler.flavor, self.flavor);
        if let Some(path) = self.r.rule_file(&config.compiler_flavor_rule_dir, &compiler_flavor) {
            writeln!(f, "include {path}")?;
        }
        let flavor_extravars = self.config.map(|c| c.extravars.as_slice()).unwrap_or_default();
        for ev in flavor_extravars.iter().chain(&config.extravars) {
            writeln!(f, "include {ev}")?;
        }
        writeln!(f, "include $buildtooldir/rules/static.ninja")?;
        for objdir in self.subninjas {
            writeln!(f, "subninja {}/{objdir}.ninja", self.builddir)?;
        }

        write!(f, "build {}/analyse: final_analyse", self.builddir)?;
        for an in ops.analyses.iter().filter(|an| an.valid_for_flavor(self.flavor)) {
            write!(f, " {}/{}", self.builddir, an.target_name)?;
        }
        writeln!(f)?;

        write!(f, "build {}: phony", self.flavor)?;
        write_list(f, &self.defaults)?;
        writeln!(f)
    }
}

struct Buildvars<'a> {
    r: &'a Renderer<'a>,
    flavor: &'a str,
    destdir: String,
    builddir: String,
    config: Option<&'a FlavorConfig>,
}

impl Display for Buildvars<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ops = self.r.ops;
        let prefix = self.config.map(|c| c.prefix.as_str()).unwrap_or_default();
        writeln!(f, "buildpath={}", ops.config.buildpath)?;
        writeln!(f, "flavorroot={}", self.destdir)?;
        writeln!(f, "destprefix={prefix}")?;
        writeln!(f, "destroot={}", paths::join([self.destdir.as_str(), prefix]))?;
        writeln!(f, "builddir={}", self.builddir)?;
        writeln!(f, "buildtools=$builddir/tools")?;
        writeln!(f, "incdir=$builddir/include")?;
        writeln!(f, "libdir=$builddir/lib")?;
        writeln!(f, "dest_bin=$destroot/bin")?;
        writeln!(f, "dest_mod=$destroot/modules")?;
        writeln!(f, "dest_lib=$destroot/lib")?;
        writeln!(f, "buildversion={}", ops.buildversion)?;
        writeln!(f, "buildflavor={}", self.flavor)?;
        if let Some(config) = self.config {
            writeln!(f, "flavor_cflags={}", config.cflags)?;
        }
        writeln!(f)?;
        for cond in &ops.config.conditions {
            writeln!(f, "{cond}=1")?;
        }
        Ok(())
    }
}

/// Pick a unique object directory for each descriptor valid in `flavor`.
///
/// Collisions get a numeric suffix counting up from zero.
fn object_dir(taken: &BTreeSet<String>, base: &str) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }
    (0_u32..)
        .map(|i| format!("{base}{i}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// Render the files of `flavor` into `out`.
pub(super) fn render(r: &Renderer<'_>, flavor: &str, out: &mut Output) {
    let ops = r.ops;
    let toppath = ops.config.buildpath.as_str();
    let destdir = paths::join([toppath, flavor]);
    let builddir = paths::join([toppath, "obj", flavor]);
    let config = ops.flavor_configs.get(flavor);
    let prefix = config.map(|c| c.prefix.as_str()).unwrap_or_default();

    out.push_dir(paths::join([destdir.as_str(), prefix]));
    out.push_dir(builddir.clone());

    let mut subninjas = BTreeSet::new();
    let mut defaults = Vec::new();
    for desc in ops.descriptors.iter().filter(|d| d.general.valid_for_flavor(flavor)) {
        let objdir = object_dir(&subninjas, &desc.general.default_object_dir());
        let file = DescriptorFile::new(ops, desc, &objdir);
        defaults.extend(file.defaults());
        out.push_dir(paths::join([builddir.as_str(), objdir.as_str()]));
        out.push_file(format!("{builddir}/{objdir}.ninja"), file, false);
        subninjas.insert(objdir);
    }

    let flavor_file = FlavorFile {
        r,
        flavor,
        builddir: builddir.clone(),
        config,
        subninjas: &subninjas,
        defaults,
    };
    out.push_file(paths::join([builddir.as_str(), "build.ninja"]), flavor_file, false);

    let buildvars = Buildvars {
        r,
        flavor,
        destdir,
        builddir: builddir.clone(),
        config,
    };
    out.push_file(paths::join([builddir.as_str(), "buildvars.ninja"]), buildvars, true);
}
