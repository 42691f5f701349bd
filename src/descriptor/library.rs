//! `LIB` and `LINKERSET_LIB`.

use super::general::GeneralDesc;
use super::link::LinkDesc;
use super::target::TargetOption;
use crate::args::ArgMap;
use crate::error::{ParseError, Result};
use crate::libs::LibInfo;
use crate::ops::GlobalOps;
use crate::paths;

/// Library descriptor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibDesc {
    /// Link record.
    pub link: LinkDesc,
    /// Build one pre-linked object instead of an archive.
    pub link_set: bool,
}

impl LibDesc {
    pub(super) fn instantiate(&self) -> Self {
        Self {
            link: self.link.instantiate(),
            link_set: self.link_set,
        }
    }

    /// Install `includes[...]` below `dest_inc`, or `dest_inc/<incprefix>`.
    pub(super) fn parse_includes(&mut self, g: &mut GeneralDesc, args: &ArgMap) -> Result<(), ParseError> {
        let includes = args.get("includes").map(Vec::as_slice).unwrap_or_default();
        self.link.includes.extend(includes.iter().cloned());
        let dest = args
            .get("incprefix")
            .and_then(|prefix| prefix.first())
            .map_or_else(|| "dest_inc".to_owned(), |prefix| paths::join(["dest_inc", prefix.as_str()]));
        let srcdir = g.srcdir.clone();
        for inc in includes {
            g.add_target(inc, "install_header", vec![inc.clone()], &dest, &srcdir)?;
        }
        Ok(())
    }

    /// Summary registered for dependents.
    #[must_use]
    pub fn info(&self, name: &str) -> LibInfo {
        LibInfo {
            name: name.to_owned(),
            deps: self.link.libs.clone(),
            dummy: self.link.objs.is_empty(),
            link_set: self.link_set,
            link: self.link.link.clone(),
        }
    }

    pub(super) fn finalize(&mut self, g: &mut GeneralDesc, ops: &mut GlobalOps) -> Result<()> {
        let name = g.target_name.clone();
        self.link.finalize_cc(g, ops);

        if self.link_set || !self.link.objs.is_empty() {
            let objs = self.link.suffixed_objs(".o", |_| true);
            let picobjs = self.link.suffixed_objs(".pic_o", |_| true);
            let (rule, ext) = if self.link_set { ("partiallink", "o") } else { ("ar", "a") };
            let destdir = g.destdir.clone();
            let options = g.target_options.clone();
            g.add_target(&format!("lib{name}.{ext}"), rule, objs, &destdir, "")?
                .with_options(options.iter().copied());
            g.add_target(&format!("lib{name}_pic.{ext}"), rule, picobjs, &destdir, "")?
                .with_options(options);
        }

        let marker = format!("depend_includes_{name}");
        g.deps.insert(marker.clone(), self.link.resolve_incdeps(ops));
        let srcdir = g.srcdir.clone();
        g.add_target(&marker, "phony", self.link.includes.clone(), "builddir", &srcdir)?
            .with_options([TargetOption::EmptySrcs]);

        self.link.finalize_analyse(g, ops)
    }
}
