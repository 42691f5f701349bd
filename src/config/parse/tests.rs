use crate::error::{BuildError, ParseErrorKind};
use crate::ops::Options;
use crate::testing::{tree, tree_with};
use rstest::rstest;
use std::collections::BTreeSet;

#[test]
fn flavor_selection_follows_options() {
    let options = Options {
        without_flavors: BTreeSet::from(["asan".to_owned()]),
        ..Options::default()
    };
    let mut t = tree_with(options, &[]);
    t.parse("Builddesc", "", "CONFIG(flavors[dev prod asan] prefix:prod[/opt/app])\n")
        .expect("parse");
    assert_eq!(t.ops.config.active_flavors, ["dev", "prod"]);
    assert_eq!(t.ops.config.all_flavors.len(), 3);
    assert_eq!(t.ops.flavor_configs["prod"].prefix, "/opt/app");
    assert_eq!(t.ops.flavor_configs["dev"].prefix, "");
    assert!(!t.ops.flavor_configs.contains_key("asan"));
}

#[test]
fn with_flavor_keeps_only_named() {
    let options = Options {
        with_flavors: BTreeSet::from(["prod".to_owned()]),
        ..Options::default()
    };
    let mut t = tree_with(options, &[]);
    t.parse("Builddesc", "", "CONFIG(flavors[dev prod])\n").expect("parse");
    assert_eq!(t.ops.config.active_flavors, ["prod"]);
}

#[test]
fn file_lists_are_relative_to_the_config_directory() {
    let mut t = tree(&[]);
    t.parse(
        "top/Builddesc",
        "top",
        "CONFIG(rules[rules/local.ninja] configvars[vars.ninja] godeps[Godeps])\n",
    )
    .expect("parse");
    assert_eq!(t.ops.config.rules, ["top/rules/local.ninja"]);
    assert_eq!(t.ops.config.configvars, ["top/vars.ninja"]);
    assert_eq!(t.ops.config.godeps, ["top/Godeps"]);
}

#[test]
fn included_config_follows_local_files() {
    let mut t = tree(&[("conf/common.conf", "rules[inc.ninja] buildvars[copts]\n")]);
    t.parse(
        "Builddesc",
        "",
        "CONFIG(INCLUDE[./conf/common.conf] rules[local.ninja] buildpath[out])\n",
    )
    .expect("parse");
    assert_eq!(t.ops.config.rules, ["local.ninja", "conf/inc.ninja"]);
    assert_eq!(t.ops.config.buildvars, ["copts"]);
    assert_eq!(t.ops.config.buildpath, "out");
    assert!(t.ops.builddescs.contains(&"conf/common.conf".to_owned()));
}

#[test]
fn ruledeps_extend_defaults() {
    let mut t = tree(&[]);
    t.parse("Builddesc", "", "CONFIG(ruledeps[in:a,b cc:gen.h])\n")
        .expect("parse");
    assert_eq!(
        t.ops.config.ruledeps["in"],
        ["$inconf", "$configvars", "a", "b"]
    );
    assert_eq!(t.ops.config.ruledeps["cc"], ["gen.h"]);
}

#[test]
fn config_script_adds_conditions_and_params() {
    let mut t = tree(&[]);
    t.parse(
        "Builddesc",
        "",
        "CONFIG(config_script[echo fast; echo opt=1])\nPROG(app srcs[main.c] srcs::fast[turbo.c])\n",
    )
    .expect("parse");
    assert!(t.ops.config.conditions.contains("fast"));
    assert_eq!(t.ops.config.buildparams, ["opt=1"]);
    let link = t.ops.descriptors[0].kind.link().expect("link");
    assert_eq!(link.objs, ["main", "turbo"]);
}

#[test]
fn failing_config_script_aborts() {
    let mut t = tree(&[]);
    let err = t
        .parse("Builddesc", "", "CONFIG(config_script[exit 3])\n")
        .expect_err("script failure");
    assert!(matches!(err, BuildError::ConfigScript { .. }));
}

#[test]
fn missing_plugins_are_reported() {
    let mut t = tree(&[]);
    let err = t
        .parse("Builddesc", "", "CONFIG(extensions[plugins/nope plugins/gone])\n")
        .expect_err("missing");
    match err {
        BuildError::MissingPlugins { plugins } => {
            assert_eq!(plugins, ["plugins/nope", "plugins/gone"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
#[case("CONFIG(bogus[1])\n", ParseErrorKind::ConfigUnknownArg)]
#[case("CONFIG(flavors[dev] bogus:dev[1])\n", ParseErrorKind::FlavoredConfigUnknownArg)]
#[case("CONFIG(prefix[/usr])\n", ParseErrorKind::ConfigMustBeFlavored)]
#[case("CONFIG(flavors[dev] prefix:prod[/usr])\n", ParseErrorKind::BadFlavor)]
#[case("CONFIG(rules::linux[a.ninja])\n", ParseErrorKind::ConditionsNotAllowed)]
#[case("CONFIG(ruledeps[nocolon])\n", ParseErrorKind::BadRuledeps)]
fn config_errors(#[case] text: &str, #[case] kind: ParseErrorKind) {
    let mut t = tree(&[]);
    let err = t.parse("Builddesc", "", text).expect_err("error");
    assert_eq!(err.parse_kind(), Some(kind));
}
