//! End-to-end generation through the compiled binary.
//!
//! Every test writes a description tree next to a rule runtime, runs
//! `builddesc --noexec` inside it and inspects the files written.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use insta::assert_snapshot;
use ninja_env::{BUILDPATH_ENV, BUILDTOOLDIR_ENV, NINJA_ENV, REGENERATE_ENV};
use predicates::prelude::*;
use rstest::{fixture, rstest};
use test_support::DescTree;

const TOP: &str = "CONFIG(flavors[dev prod] buildversion_script[echo 3])\nCOMPONENT([etc])\n";
const ETC: &str = "INSTALL(etc symlink[current:app.conf])\n";

#[fixture]
fn tree() -> DescTree {
    let tree = DescTree::new(&[("Builddesc", TOP), ("etc/Builddesc", ETC)]).expect("tree");
    tree.write_tool("rules/flavor/prod.ninja", "").expect("flavor rules");
    tree
}

fn builddesc(tree: &DescTree) -> Result<Command> {
    let mut cmd = Command::cargo_bin("builddesc").context("locate builddesc binary")?;
    cmd.current_dir(tree.topdir())
        .env(BUILDTOOLDIR_ENV, tree.buildtooldir())
        .env_remove(BUILDPATH_ENV)
        .env_remove(REGENERATE_ENV)
        .env(NINJA_ENV, "/nonexistent/ninja");
    Ok(cmd)
}

#[rstest]
fn writes_every_flavor(tree: DescTree) -> Result<()> {
    builddesc(&tree)?
        .arg("--noexec")
        .assert()
        .success()
        .stderr(predicate::str::contains("Entering directory"));

    assert_snapshot!(tree.read("build/obj/dev/build.ninja")?, @r"
buildvars=build/obj/dev/buildvars.ninja
include $buildvars
include $buildtooldir/rules/static.ninja
subninja build/obj/dev/etc/etc.ninja
build build/obj/dev/analyse: final_analyse
build dev: phony $destroot/etc/current
");
    let prod = tree.read("build/obj/prod/build.ninja")?;
    ensure!(
        prod.contains("include $buildtooldir/rules/flavor/prod.ninja\n"),
        "prod rules not included:\n{prod}"
    );

    assert_snapshot!(tree.read("build/obj/prod/etc/etc.ninja")?, @r"
objdir=$builddir/etc/etc
build $destroot/etc/current: symlink
    target=app.conf
default $destroot/etc/current
");

    let buildvars = tree.read("build/obj/dev/buildvars.ninja")?;
    ensure!(buildvars.contains("buildversion=3\n"), "missing version:\n{buildvars}");
    ensure!(buildvars.contains("destroot=build/dev\n"), "wrong destroot:\n{buildvars}");
    ensure!(tree.exists("build/dev"), "flavor root not created");
    Ok(())
}

#[rstest]
fn top_file_records_invocation_and_inputs(tree: DescTree) -> Result<()> {
    builddesc(&tree)?.args(["--noexec", "--", "-j2"]).assert().success();
    let top = tree.read("build/build.ninja")?;
    let first = top.lines().next().context("empty top file")?;
    ensure!(first.starts_with("# ") && first.ends_with("builddesc --noexec"), "first line {first:?}");
    let tools = format!("buildtooldir={}\n", tree.buildtooldir());
    ensure!(top.contains(&tools), "missing {tools:?}:\n{top}");
    ensure!(
        top.contains("build build/build.ninja: generate_ninjas Builddesc etc/Builddesc\n"),
        "regeneration inputs:\n{top}"
    );
    ensure!(top.ends_with("build all: phony dev prod\ndefault all\n"), "tail:\n{top}");
    Ok(())
}

#[rstest]
fn discovers_topdir_from_a_component(tree: DescTree) -> Result<()> {
    builddesc(&tree)?
        .current_dir(tree.topdir().join("etc"))
        .args(["--noexec", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    ensure!(tree.exists("build/build.ninja"), "top file not written in topdir");
    ensure!(!tree.exists("etc/build"), "files written in component");
    Ok(())
}

#[rstest]
fn restricts_flavors(tree: DescTree) -> Result<()> {
    builddesc(&tree)?
        .args(["--noexec", "--with-flavor", "prod"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Building only requested flavor(s): prod"));
    ensure!(tree.exists("build/obj/prod/build.ninja"), "prod missing");
    ensure!(!tree.exists("build/obj/dev"), "dev written");
    let top = tree.read("build/build.ninja")?;
    ensure!(top.contains("# Flavors: prod\n"), "flavors:\n{top}");
    Ok(())
}

#[rstest]
fn buildpath_comes_from_the_environment(tree: DescTree) -> Result<()> {
    builddesc(&tree)?
        .env(BUILDPATH_ENV, "out")
        .arg("--noexec")
        .assert()
        .success();
    ensure!(tree.exists("out/obj/dev/buildvars.ninja"), "BUILDPATH ignored");
    ensure!(!tree.exists("build"), "default build path used");
    Ok(())
}

#[rstest]
fn dump_config_prints_json_without_writing(tree: DescTree) -> Result<()> {
    let output = builddesc(&tree)?
        .args(["--dump-config", "--condition", "fast"])
        .output()
        .context("run builddesc --dump-config")?;
    ensure!(output.status.success(), "dump failed: {}", String::from_utf8_lossy(&output.stderr));
    let dump: serde_json::Value = serde_json::from_slice(&output.stdout).context("parse dump")?;
    ensure!(dump["config"]["active_flavors"] == serde_json::json!(["dev", "prod"]), "{dump}");
    ensure!(dump["config"]["buildpath"] == "build", "{dump}");
    let conditions = dump["config"]["conditions"].as_array().context("conditions")?;
    ensure!(conditions.iter().any(|c| c == "fast"), "{dump}");
    ensure!(!tree.exists("build"), "dump wrote files");
    Ok(())
}

#[rstest]
fn reports_description_errors(tree: DescTree) -> Result<()> {
    tree.write("etc/Builddesc", "NOSUCH(thing)\n")?;
    builddesc(&tree)?
        .arg("--noexec")
        .assert()
        .failure()
        .stderr(predicate::str::contains("etc/Builddesc").and(predicate::str::contains("NOSUCH")));
    Ok(())
}

#[test]
fn fails_outside_a_tree() -> Result<()> {
    let empty = tempfile::tempdir().context("create temp dir")?;
    let tree = DescTree::new(&[])?;
    Command::cargo_bin("builddesc")
        .context("locate builddesc binary")?
        .current_dir(empty.path())
        .env(BUILDTOOLDIR_ENV, tree.buildtooldir())
        .arg("--noexec")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Builddesc found"));
    Ok(())
}
