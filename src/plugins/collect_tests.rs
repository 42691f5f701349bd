//! `collect_go_tests`: a target listing collected test binaries.
//!
//! The sources of a `collect_go_tests` special source name collected
//! variables such as `$_gotest`. They are only known once other
//! descriptors are finalized, so the target is added from a finalize hook.

use crate::descriptor::{Descriptor, FinalizeHook, SpecialSrc, TargetOption};
use crate::error::Result;
use crate::ops::GlobalOps;
use crate::registry::Plugin;
use std::sync::Arc;

/// Special-source rule claimed by this plugin.
const RULE: &str = "collect_go_tests";

/// Rule of the emitted target.
const EMIT_RULE: &str = "gotest_to_rdep";

/// Registers the `collect_go_tests` special-source rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectTests;

impl Plugin for CollectTests {
    fn name(&self) -> &str {
        "collect_tests"
    }

    fn startup(&self, ops: &mut GlobalOps) -> Result<()> {
        ops.registry
            .special_srcs
            .insert(RULE.to_owned(), Arc::new(defer_until_finalize));
        Ok(())
    }
}

fn defer_until_finalize(desc: &mut Descriptor, _ops: &GlobalOps, special: SpecialSrc) -> Result<()> {
    desc.finalize_hooks.push(Arc::new(CollectHook { special }));
    Ok(())
}

#[derive(Debug)]
struct CollectHook {
    special: SpecialSrc,
}

impl FinalizeHook for CollectHook {
    fn finalize(&self, desc: &mut Descriptor, ops: &mut GlobalOps) -> Result<()> {
        let tests: Vec<String> = self
            .special
            .sources
            .iter()
            .map(|src| ops.resolve_collected_var(src))
            .filter(|resolved| !resolved.is_empty())
            .collect();
        let mut args = self.special.extraargs.clone();
        args.push(format!("gotest_list = {}", tests.join(" ")));
        desc.general
            .add_target(
                &self.special.target,
                EMIT_RULE,
                Vec::new(),
                &self.special.destdir,
                &self.special.srcdir,
            )?
            .with_args(args)
            .with_options([TargetOption::EmptySrcs]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ninja_gen::DescriptorFile;
    use crate::testing::tree;

    #[test]
    fn lists_collected_tests_after_finalize() {
        let mut t = tree(&[]);
        t.ops.provide_plugin(Arc::new(CollectTests));
        t.parse(
            "Builddesc",
            "",
            "CONFIG(extensions[plugins/collect_tests])\n\
             INSTALL(runtests specialsrcs[collect_go_tests:$_gotest:tests.rdep])\n",
        )
        .expect("parse");
        t.ops
            .collected_vars
            .insert("_gotest".to_owned(), vec!["$objdir/a.test".to_owned(), "$objdir/b.test".to_owned()]);
        t.ops.run_finalizers().expect("finalize");

        assert_eq!(t.ops.plugin_paths, ["plugins/collect_tests"]);
        let desc = t
            .ops
            .descriptors
            .iter()
            .find(|d| d.general.target_name == "runtests")
            .expect("descriptor");
        let target = desc.general.targets.get("tests.rdep").expect("target");
        assert_eq!(target.rule, "gotest_to_rdep");
        assert!(target.sources.is_empty());
        assert!(target.has(TargetOption::EmptySrcs));
        assert_eq!(target.extraargs, ["gotest_list = $objdir/a.test $objdir/b.test"]);

        let text = DescriptorFile::new(&t.ops, desc, "x").to_string();
        assert!(text.contains("build $objdir/tests.rdep: gotest_to_rdep\n    gotest_list = $objdir/a.test $objdir/b.test\n"));
    }
}
