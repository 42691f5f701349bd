//! Source dispatch by file extension.
//!
//! Every descriptor understands `.in`. Linking descriptors add the C, C++,
//! parser generator, gperf, XS and Go extensions. Plugin handlers for an
//! extension take precedence over the built-in ones. Generated sources are
//! fed back through dispatch until they reach an object file.

use super::general::GeneralDesc;
use super::link::LinkDesc;
use super::target::TargetOption;
use super::{Descriptor, SpecialSrc};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ops::GlobalOps;
use crate::paths;
use crate::registry::{Registry, Source};

impl Descriptor {
    /// Compile `src`, found in `srcdir`, according to its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::UnknownSourceExtension`] when neither the
    /// descriptor family nor any plugin handles the extension.
    pub fn compile_src(&mut self, registry: &Registry, srcdir: &str, src: &str) -> Result<()> {
        let (base, ext) = paths::split_ext(src);
        let source = Source { srcdir, src, base };
        let Self { general, kind, .. } = self;
        match kind.link_mut() {
            Some(link) => compile_link(general, link, registry, ext, &source),
            None => compile_general(general, registry, ext, &source),
        }
    }

    /// Add a target bypassing extension dispatch.
    ///
    /// Plugins may claim the rule; otherwise the target is added as given,
    /// with comma-separated names forming one multi-target.
    ///
    /// # Errors
    ///
    /// Fails on target collisions or plugin handler errors.
    pub fn compile_special(&mut self, ops: &GlobalOps, mut special: SpecialSrc) -> Result<()> {
        if matches!(special.sources.as_slice(), [only] if only.is_empty()) {
            special.options.insert(TargetOption::EmptySrcs);
            special.sources.clear();
        }
        if let Some(handler) = ops.registry.special_srcs.get(&special.rule).cloned() {
            return handler(self, ops, special);
        }
        let names: Vec<String> = special.target.split(',').map(str::to_owned).collect();
        let primary = names.first().cloned().unwrap_or_default();
        self.general
            .add_target(&primary, &special.rule, special.sources, &special.destdir, &special.srcdir)?
            .with_args(special.extraargs)
            .with_options(special.options);
        if names.len() > 1 {
            self.general.add_multi_target(names, &primary);
        }
        Ok(())
    }
}

fn compile_general(g: &mut GeneralDesc, registry: &Registry, ext: &str, source: &Source<'_>) -> Result<()> {
    if let Some(handler) = registry.general_extensions.get(ext) {
        return handler(g, source);
    }
    match ext {
        "in" => {
            g.add_target(source.base, "in", vec![source.src.to_owned()], "obj", source.srcdir)?;
            Ok(())
        }
        _ => Err(ParseError::new(ParseErrorKind::UnknownSourceExtension, source.src, g.builddesc.clone()).into()),
    }
}

fn compile_link(
    g: &mut GeneralDesc,
    l: &mut LinkDesc,
    registry: &Registry,
    ext: &str,
    source: &Source<'_>,
) -> Result<()> {
    if let Some(handler) = registry.linker_extensions.get(ext) {
        return handler(g, l, source);
    }
    let Source { srcdir, src, base } = *source;
    match ext {
        "c" => l.compile_object(g, srcdir, src, base, Lang::C),
        "cc" | "cxx" => l.compile_object(g, srcdir, src, base, Lang::Cxx),
        "yy" => l.compile_yy(g, srcdir, src, base),
        "ll" => l.compile_ll(g, srcdir, src, base),
        "gperf" => l.compile_gperf(g, srcdir, src, base),
        "enum" => l.compile_enum(g, srcdir, src, base),
        "xs" => l.compile_xs(g, srcdir, src, base),
        "go" => l.compile_go(g, srcdir, src),
        _ => return compile_general(g, registry, ext, source),
    }?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Lang {
    C,
    Cxx,
}

impl Lang {
    const fn rules(self) -> (&'static str, &'static str) {
        match self {
            Self::C => ("cc", "cc_analyse"),
            Self::Cxx => ("cxx", "cxx_analyse"),
        }
    }
}

impl LinkDesc {
    fn compile_object(
        &mut self,
        g: &mut GeneralDesc,
        srcdir: &str,
        src: &str,
        base: &str,
        lang: Lang,
    ) -> Result<(), ParseError> {
        let (rule, analyse_rule) = lang.rules();
        if matches!(lang, Lang::Cxx) {
            "linkxx".clone_into(&mut self.link);
        }
        let incdeps = [TargetOption::Incdeps];
        g.add_target(&format!("{base}.o"), rule, vec![src.to_owned()], "obj", srcdir)?
            .with_options(incdeps);
        if self.picrules {
            g.add_target(&format!("{base}.pic_o"), rule, vec![src.to_owned()], "obj", srcdir)?
                .with_args(["picflag=-fPIC"])
                .with_options(incdeps);
        }
        if self.no_analyse {
            self.dont_analyse.insert(base.to_owned());
        } else {
            g.add_target(&format!("{base}.analyse"), analyse_rule, vec![src.to_owned()], "obj", srcdir)?
                .with_options(incdeps);
        }
        self.objs.push(base.to_owned());
        Ok(())
    }

    fn compile_yy(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str, base: &str) -> Result<(), ParseError> {
        let generated = format!("{base}.cc");
        let header = format!("{base}.hh");
        g.add_target(&generated, "yaccxx", vec![src.to_owned()], "obj", srcdir)?;
        g.add_target(&header, "phony", vec![generated.clone()], "obj", "")?;
        self.incdeps.push(header);
        self.compile_object(g, srcdir, &generated, base, Lang::Cxx)
    }

    fn compile_ll(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str, base: &str) -> Result<(), ParseError> {
        let generated = format!("{base}.cc");
        g.add_target(&generated, "flexx", vec![src.to_owned()], "obj", srcdir)?;
        self.compile_object(g, srcdir, &generated, base, Lang::Cxx)
    }

    fn compile_gperf(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str, base: &str) -> Result<(), ParseError> {
        let header = format!("{base}.h");
        g.add_target(&header, "gperf", vec![src.to_owned()], "obj", srcdir)?;
        self.incdeps.push(header);
        Ok(())
    }

    fn compile_enum(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str, base: &str) -> Result<(), ParseError> {
        g.add_target(base, "gperf_enum", vec![src.to_owned()], "obj", srcdir)?;
        let Some(stem) = base.strip_suffix(".gperf") else {
            return Err(ParseError::new(ParseErrorKind::EnumWithoutGperf, src, g.builddesc.clone()));
        };
        self.compile_gperf(g, "", base, stem)
    }

    fn compile_xs(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str, base: &str) -> Result<(), ParseError> {
        let generated = format!("{base}.c");
        g.add_target(&generated, "xs", vec![src.to_owned()], "obj", srcdir)?;
        self.compile_object(g, "", &generated, base, Lang::C)
    }

    fn compile_go(&mut self, g: &mut GeneralDesc, srcdir: &str, src: &str) -> Result<(), ParseError> {
        g.add_target(&paths::join(["go", src]), "copy_go", vec![src.to_owned()], "obj", srcdir)?;
        self.go_srcs.push(paths::join(["$objdir/go", src]));
        Ok(())
    }
}
