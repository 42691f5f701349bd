//! CLI execution.
//!
//! This module keeps `main` minimal by providing a single entry point. A run
//! locates the tree, reads every description file, writes the Ninja files
//! and hands over to the Ninja subprocess, streaming its output back to the
//! user. When the build file from an identical earlier invocation exists,
//! reading stops after `CONFIG` and Ninja is run on that file directly; its
//! own regeneration rule takes care of anything that changed.

mod error;
mod process;
mod topdir;

pub use error::RunnerError;
pub use process::{resolve_ninja_program, run_ninja};
pub use topdir::{find_topdir, resolve_buildtooldir};

use crate::cli::Cli;
use crate::compiler::ProcessProbe;
use crate::config::script::BuildVersionProbe;
use crate::ninja_gen::{self, Invocation};
use crate::ops::{Flow, FsGlobber, GlobalOps, Options, PostConfigHook};
use crate::{paths, plugins};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ninja_env::{BUILDPATH_ENV, REGENERATE_ENV};
use std::cell::RefCell;
use std::env;
use std::ffi::OsStr;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// Default Ninja executable to invoke.
pub const NINJA_PROGRAM: &str = "ninja";
/// Environment variable override for the Ninja executable.
pub use ninja_env::NINJA_ENV;

/// Slot the post-config hook parks the build-version probe in.
type ProbeSlot = Rc<RefCell<Option<BuildVersionProbe>>>;

/// The command line that produced a build file, as recorded on its first
/// line and used by the regeneration rule.
///
/// Arguments after `--` go to Ninja and are left out.
///
/// # Examples
///
/// ```
/// use builddesc::runner::invocation_line;
/// let line = invocation_line(["builddesc", "--with-flavor", "dev", "--", "-j4"]);
/// assert_eq!(line, "builddesc --with-flavor dev");
/// ```
#[must_use]
pub fn invocation_line<I>(argv: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let words: Vec<String> = argv
        .into_iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .take_while(|arg| arg != "--")
        .collect();
    shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
}

fn options(cli: &Cli) -> Options {
    Options {
        with_flavors: cli.with_flavor.iter().cloned().collect(),
        without_flavors: cli.without_flavor.iter().cloned().collect(),
        conditions: cli.condition.iter().cloned().collect(),
        configvars: cli.configvars.clone(),
        quiet: cli.quiet,
    }
}

fn utf8_path(path: &Path) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|p| RunnerError::NonUtf8Path {
        path: p.display().to_string(),
    })
}

fn absolute(cwd: &Utf8Path, path: &Path) -> Result<Utf8PathBuf, RunnerError> {
    let utf8 = utf8_path(path)?;
    Ok(if utf8.is_absolute() { utf8 } else { cwd.join(utf8) })
}

/// Whether the top build file was written by this very invocation.
fn build_file_matches(ops: &GlobalOps, invocation: &str) -> bool {
    let build_file = paths::join([ops.config.buildpath.as_str(), "build.ninja"]);
    process::first_line(ops.root(), Utf8Path::new(&build_file))
        .is_some_and(|line| line == format!("# {invocation}"))
}

/// Hook run once `CONFIG` is known: decide on hand-off, then start the
/// build-version probe.
fn post_config_hook(invocation: String, may_handoff: bool, spawn_probe: bool, slot: ProbeSlot) -> PostConfigHook {
    Box::new(move |ops: &GlobalOps| {
        if may_handoff && build_file_matches(ops, &invocation) {
            debug!("existing build file matches invocation");
            return Ok(Flow::Handoff);
        }
        let script = ops.config.buildversion_script.as_str();
        if spawn_probe && !script.is_empty() {
            slot.borrow_mut()
                .get_or_insert_with(|| BuildVersionProbe::spawn(script));
        }
        Ok(Flow::Continue)
    })
}

/// Run the whole pipeline for `cli`.
///
/// `invocation` is the command line recorded in the top build file, see
/// [`invocation_line`].
///
/// # Errors
///
/// Returns an error if the tree cannot be located or read, a description
/// is invalid, the files cannot be written, or Ninja fails.
pub fn run(cli: &Cli, invocation: &str) -> Result<()> {
    let cwd_std = env::current_dir().context("determine current directory")?;
    let cwd = utf8_path(&cwd_std)?;
    let topdir = match &cli.topdir {
        Some(dir) => absolute(&cwd, dir)?,
        None => find_topdir(&cwd)?,
    };
    let flag = cli
        .buildtooldir
        .as_deref()
        .map(|dir| absolute(&cwd, dir))
        .transpose()?;
    let buildtooldir = resolve_buildtooldir(flag.as_deref())?;
    debug!(%buildtooldir, "using build tools");

    info!("Entering directory `{topdir}'");
    env::set_current_dir(&topdir).with_context(|| format!("enter directory {topdir}"))?;
    let root = Dir::open_ambient_dir(&topdir, ambient_authority())
        .with_context(|| format!("open directory {topdir}"))?;

    let buildpath = env::var(BUILDPATH_ENV).ok();
    let mut ops = GlobalOps::new(options(cli), root, Box::new(FsGlobber::new(topdir.clone())), buildpath.as_deref());
    for plugin in plugins::bundled() {
        ops.provide_plugin(plugin);
    }

    let regenerating = env::var_os(REGENERATE_ENV).is_some();
    let may_handoff = !(cli.noexec || cli.force || cli.dump_config || regenerating);
    let probe: ProbeSlot = Rc::default();
    ops.set_post_config(post_config_hook(
        invocation.to_owned(),
        may_handoff,
        !cli.dump_config,
        Rc::clone(&probe),
    ));

    ops.read_component("", None)?;
    let build_file = paths::join([ops.config.buildpath.as_str(), "build.ninja"]);
    let program = resolve_ninja_program();

    if ops.handed_off() {
        info!("{build_file} is up to date");
        return run_ninja(&program, &topdir, &build_file, &cli.ninja_args);
    }

    if cli.dump_config {
        let dump = serde_json::json!({
            "config": &ops.config,
            "flavors": &ops.flavor_configs,
            "plugins": &ops.plugin_paths,
        });
        let text = serde_json::to_string_pretty(&dump).context("serialise configuration")?;
        return process::write_stdout(&format!("{text}\n"));
    }

    if ops.config.active_flavors.len() != ops.config.all_flavors.len() {
        info!(
            "Building only requested flavor(s): {}",
            ops.config.active_flavors.join(", ")
        );
    }

    ops.run_finalizers()?;
    let env_cc = env::var("CC").ok();
    ops.run_version_checks(&ProcessProbe, env_cc.as_deref())?;

    let pending = probe.borrow_mut().take();
    let script = ops.config.buildversion_script.clone();
    let started = pending.or_else(|| (!script.is_empty()).then(|| BuildVersionProbe::spawn(&script)));
    if let Some(running) = started {
        ops.buildversion = running.join()?;
    }

    let output = ninja_gen::generate(
        &ops,
        Invocation {
            args: invocation,
            buildtooldir: buildtooldir.as_str(),
        },
    );
    process::write_output(ops.root(), &output)?;
    info!("Wrote {build_file}");

    if cli.noexec || regenerating {
        return Ok(());
    }
    run_ninja(&program, &topdir, &build_file, &cli.ninja_args)
}
