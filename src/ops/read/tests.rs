use super::*;
use crate::ops::Options;
use crate::testing::{tree, tree_with};
use rstest::rstest;

fn flavors_of(ops: &GlobalOps) -> Vec<Vec<String>> {
    ops.descriptors
        .iter()
        .map(|d| d.general.only_for_flavors.clone())
        .collect()
}

#[test]
fn top_directory_prefers_top_file() {
    let mut t = tree(&[
        ("Builddesc.top", "PROG(top srcs[main.c])\n"),
        ("Builddesc", "PROG(plain srcs[main.c])\n"),
    ]);
    t.ops.read_component("", None).expect("read");
    assert_eq!(t.ops.descriptors.len(), 1);
    assert_eq!(t.ops.descriptors[0].general.target_name, "top");
    assert_eq!(t.ops.builddescs, ["Builddesc.top"]);
}

#[test]
fn components_recurse_with_their_directory() {
    let mut t = tree(&[
        ("Builddesc", "CONFIG(flavors[dev prod])\nCOMPONENT([lib])\n"),
        ("lib/Builddesc", "LIB(foo srcs[foo.c])\nCOMPONENT([sub])\n"),
        ("lib/sub/Builddesc", "PROG(tool srcs[tool.c])\n"),
    ]);
    t.ops.read_component("", None).expect("read");
    let foo = &t.ops.descriptors[0];
    assert_eq!(foo.general.srcdir, "lib");
    assert_eq!(foo.general.builddesc, "lib/Builddesc");
    assert_eq!(t.ops.descriptors[1].general.srcdir, "lib/sub");
    assert_eq!(flavors_of(&t.ops), [["dev", "prod"], ["dev", "prod"]]);
}

#[test]
fn component_flavors_restrict_descendants() {
    let mut t = tree(&[
        ("Builddesc", "CONFIG(flavors[dev prod])\nCOMPONENT(flavors[prod] [lib])\n"),
        ("lib/Builddesc", "LIB(foo srcs[foo.c])\n"),
    ]);
    t.ops.read_component("", None).expect("read");
    assert_eq!(flavors_of(&t.ops), [["prod"]]);
}

#[test]
fn flavored_arguments_split_descriptors() {
    let mut t = tree(&[]);
    t.parse(
        "Builddesc",
        "",
        "CONFIG(flavors[dev prod])\nPROG(app srcs[main.c] srcs:prod[extra.c])\n",
    )
    .expect("parse");
    assert_eq!(flavors_of(&t.ops), [["dev"], ["prod"]]);
    let objs = |idx: usize| t.ops.descriptors[idx].kind.link().map(|l| l.objs.clone());
    assert_eq!(objs(0), Some(vec!["main".to_owned()]));
    assert_eq!(objs(1), Some(vec!["main".to_owned(), "extra".to_owned()]));
}

#[test]
fn enabled_selects_flavors() {
    let mut t = tree(&[]);
    t.parse(
        "Builddesc",
        "",
        "CONFIG(flavors[dev prod])\nPROG(app enabled:prod[] srcs[main.c])\n",
    )
    .expect("parse");
    assert_eq!(flavors_of(&t.ops), [["prod"]]);
}

#[test]
fn explicit_flavors_override_inheritance() {
    let mut t = tree(&[]);
    t.parse(
        "Builddesc",
        "",
        "CONFIG(flavors[dev prod])\nPROG(app flavors[dev] srcs[main.c])\n",
    )
    .expect("parse");
    assert_eq!(flavors_of(&t.ops), [["dev"]]);
}

#[test]
fn conditions_gate_argument_groups() {
    let options = Options {
        conditions: ["ssl".to_owned()].into(),
        ..Options::default()
    };
    let mut t = tree_with(options, &[]);
    t.parse(
        "Builddesc",
        "",
        "PROG(app srcs[main.c] srcs::ssl[tls.c] srcs::!ssl[plain.c])\n",
    )
    .expect("parse");
    let link = t.ops.descriptors[0].kind.link().expect("link");
    assert_eq!(link.objs, ["main", "tls"]);
}

#[rstest]
#[case("PROG app", ParseErrorKind::MissingOpenParen)]
#[case("PROG(app srcs[a.c]", ParseErrorKind::MissingCloseParen)]
#[case("CONFIG()\nCONFIG()\n", ParseErrorKind::DuplicateConfig)]
#[case("PROG(app srcs[a.c])\nCONFIG()\n", ParseErrorKind::DuplicateConfig)]
#[case("FROB(app)\n", ParseErrorKind::UnhandledDirective)]
#[case("PROG(app srcs(a.c))\n", ParseErrorKind::MissingOpenBracket)]
fn structural_errors(#[case] text: &str, #[case] kind: ParseErrorKind) {
    let mut t = tree(&[]);
    let err = t.parse("Builddesc", "", text).expect_err("error");
    assert_eq!(err.parse_kind(), Some(kind));
}

#[test]
fn missing_component_is_an_io_error() {
    let mut t = tree(&[("Builddesc", "COMPONENT([nowhere])\n")]);
    let err = t.ops.read_component("", None).expect_err("missing");
    assert!(matches!(err, crate::error::BuildError::Io { ref path, .. } if path == "nowhere/Builddesc"));
}
