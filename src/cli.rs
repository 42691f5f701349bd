//! Command line interface definition using clap.
//!
//! This file is also compiled by `build.rs` to render the manual page, so
//! it depends on nothing but `clap` and the standard library.

use clap::Parser;
use std::path::PathBuf;

/// Compile Builddesc build descriptions into Ninja files and run Ninja.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "builddesc", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Only generate these declared flavors. May be repeated.
    #[arg(long = "with-flavor", value_name = "FLAVOR")]
    pub with_flavor: Vec<String>,

    /// Skip these declared flavors. May be repeated.
    #[arg(long = "without-flavor", value_name = "FLAVOR")]
    pub without_flavor: Vec<String>,

    /// Force a condition on. May be repeated.
    #[arg(long = "condition", value_name = "COND")]
    pub condition: Vec<String>,

    /// Include a config-variable file before those named by CONFIG.
    #[arg(long = "configvars", value_name = "FILE")]
    pub configvars: Vec<String>,

    /// Top directory of the tree; found from the current directory if omitted.
    #[arg(long, value_name = "DIR")]
    pub topdir: Option<PathBuf>,

    /// Directory holding the default rule files and helper scripts.
    #[arg(long, value_name = "DIR")]
    pub buildtooldir: Option<PathBuf>,

    /// Write the Ninja files but do not run Ninja.
    #[arg(long)]
    pub noexec: bool,

    /// Regenerate even if an up-to-date build file exists.
    #[arg(long)]
    pub force: bool,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long)]
    pub dump_config: bool,

    /// Arguments passed through to Ninja after `--`.
    #[arg(last = true, value_name = "NINJA_ARGS")]
    pub ninja_args: Vec<String>,
}
