use super::glob::MockGlobber;
use super::*;
use crate::descriptor::{DescriptorKind, GeneralDesc};
use crate::testing::{tree, with_globber};
use mockall::predicate::eq;

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[test]
fn unmatched_patterns_pass_through() {
    let mut globber = MockGlobber::new();
    globber
        .expect_glob()
        .with(eq("lib/gen.c"))
        .returning(|_| Ok(Vec::new()));
    let mut t = with_globber(Box::new(globber));
    assert_eq!(t.ops.glob_dir("lib", &owned(&["gen.c"])), ["gen.c"]);
    assert!(t.ops.builddescs.is_empty());
}

#[test]
fn matches_are_relative_and_deduplicated() {
    let mut globber = MockGlobber::new();
    globber
        .expect_glob()
        .with(eq("lib/*.c"))
        .returning(|_| Ok(owned(&["lib/a.c", "lib/b.c"])));
    globber
        .expect_glob()
        .with(eq("lib"))
        .returning(|_| Ok(owned(&["lib"])));
    globber
        .expect_glob()
        .with(eq("lib/a.c"))
        .returning(|_| Ok(owned(&["lib/a.c"])));
    let mut t = with_globber(Box::new(globber));
    let found = t.ops.glob_dir("lib/", &owned(&["*.c", "a.c"]));
    assert_eq!(found, ["a.c", "b.c"]);
    assert_eq!(t.ops.builddescs, ["lib"]);
}

#[test]
fn empty_source_is_not_globbed() {
    let mut globber = MockGlobber::new();
    globber.expect_glob().never();
    let mut t = with_globber(Box::new(globber));
    assert_eq!(t.ops.glob_dir("lib", &owned(&[""])), [""]);
}

#[test]
fn glob_failures_drop_the_pattern() {
    let mut globber = MockGlobber::new();
    globber.expect_glob().returning(|pattern| {
        Err(BuildError::Glob {
            pattern: pattern.to_owned(),
            message: "bad".to_owned(),
        })
    });
    let mut t = with_globber(Box::new(globber));
    assert!(t.ops.glob_dir("", &owned(&["x.c"])).is_empty());
}

#[test]
fn collected_variables_replace_dollar_references() {
    let mut t = tree(&[]);
    t.ops
        .collected_vars
        .insert("tests".to_owned(), owned(&["$destroot/a", "$destroot/b"]));
    assert_eq!(t.ops.resolve_collected_var("$tests"), "$destroot/a $destroot/b");
    assert_eq!(t.ops.resolve_collected_var("$unknown"), "$unknown");
    assert_eq!(t.ops.resolve_collected_var("tests"), "tests");
}

#[test]
fn plugin_templates_shadow_builtins() {
    let mut t = tree(&[]);
    assert!(matches!(
        t.ops.template("PROG").map(|d| d.kind),
        Some(DescriptorKind::Prog(_))
    ));
    t.ops.registry.descriptors.insert(
        "PROG".to_owned(),
        Descriptor::new(GeneralDesc::template("custom", []), DescriptorKind::General),
    );
    let shadowed = t.ops.template("PROG").expect("template");
    assert_eq!(shadowed.general.destdir, "custom");
    assert!(t.ops.template("NOPE").is_none());
}

#[test]
fn post_config_handoff_stops_reading() {
    let mut t = tree(&[]);
    t.ops.set_post_config(Box::new(|_: &GlobalOps| Ok(Flow::Handoff)));
    t.parse("Builddesc", "", "CONFIG(flavors[dev])\nBOGUS(x)\n")
        .expect("handoff stops before the bogus directive");
    assert!(t.ops.handed_off());
    assert!(t.ops.descriptors.is_empty());
}

#[test]
fn post_config_runs_once_without_config() {
    let mut t = tree(&[]);
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let seen = std::rc::Rc::clone(&calls);
    t.ops.set_post_config(Box::new(move |_: &GlobalOps| {
        seen.set(seen.get() + 1);
        Ok(Flow::Continue)
    }));
    t.parse("Builddesc", "", "PROG(a srcs[a.c])\nPROG(b srcs[b.c])\n")
        .expect("parse");
    assert_eq!(calls.get(), 1);
    assert_eq!(t.ops.descriptors.len(), 2);
}

#[test]
fn analysers_filter_by_flavor() {
    let any = Analyser {
        target_name: "a".to_owned(),
        only_for_flavors: Vec::new(),
    };
    let prod = Analyser {
        target_name: "b".to_owned(),
        only_for_flavors: owned(&["prod"]),
    };
    assert!(any.valid_for_flavor("dev"));
    assert!(prod.valid_for_flavor("prod"));
    assert!(!prod.valid_for_flavor("dev"));
}
