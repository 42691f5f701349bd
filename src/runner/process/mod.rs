//! Process helpers for writing Ninja files and running Ninja.
//! Internal to `runner`; the public entry point lives in `runner/mod.rs`.

use super::{NINJA_PROGRAM, RunnerError};
use anyhow::{Context, Result as AnyResult};
use camino::{Utf8Path, Utf8PathBuf};
use ninja_env::NINJA_ENV;
use std::{
    env,
    ffi::OsString,
    io::{self, BufReader, Read, Write},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};
use tracing::{debug, info, warn};

mod file_io;

pub use file_io::*;

fn resolve_ninja_program_utf8_with<F>(mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    read_env(NINJA_ENV)
        .and_then(|value| Utf8PathBuf::from_path_buf(PathBuf::from(value)).ok())
        .filter(|path| !path.as_str().is_empty())
        .unwrap_or_else(|| Utf8PathBuf::from(NINJA_PROGRAM))
}

/// The Ninja executable, honouring the `BUILDDESC_NINJA` override.
#[must_use]
pub fn resolve_ninja_program() -> Utf8PathBuf {
    resolve_ninja_program_utf8_with(|key| env::var_os(key))
}

/// `ninja -f <build_file> <args...>` run from `topdir`.
fn ninja_command(program: &Utf8Path, topdir: &Utf8Path, build_file: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.current_dir(topdir)
        .arg("-f")
        .arg(build_file)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn log_command_execution(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    info!("Running command: {program} {}", args.join(" "));
}

/// Run Ninja on `build_file` with `args`, streaming its output.
///
/// # Errors
///
/// Fails if Ninja cannot be spawned, its pipes are unavailable, or it
/// exits unsuccessfully.
pub fn run_ninja(program: &Utf8Path, topdir: &Utf8Path, build_file: &str, args: &[String]) -> AnyResult<()> {
    let mut cmd = ninja_command(program, topdir, build_file, args);
    log_command_execution(&cmd);
    let child = cmd
        .spawn()
        .with_context(|| format!("failed to run {program}"))?;
    let status = spawn_and_stream_output(child).context("stream ninja output")?;
    check_exit_status(status)?;
    Ok(())
}

fn handle_forwarding_thread_result(result: thread::Result<ForwardStats>, stream_name: &str) {
    match result {
        Ok(stats) => {
            if stats.write_failed {
                debug!("{stream_name} forwarding encountered closed pipe; output truncated");
            }
            debug!(bytes = stats.bytes_read, "{stream_name} forwarding finished");
        }
        Err(err) => warn!("{stream_name} forwarding thread panicked: {err:?}"),
    }
}

fn spawn_and_stream_output(mut child: Child) -> io::Result<ExitStatus> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("child process missing stderr pipe"));
    };

    let out_handle = thread::spawn(move || {
        let mut lock = io::stdout().lock();
        forward_child_output(BufReader::new(stdout), &mut lock, "stdout")
    });
    let err_handle = thread::spawn(move || {
        let mut lock = io::stderr().lock();
        forward_child_output(BufReader::new(stderr), &mut lock, "stderr")
    });

    let status = child.wait()?;
    handle_forwarding_thread_result(out_handle.join(), "stdout");
    handle_forwarding_thread_result(err_handle.join(), "stderr");
    Ok(status)
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap child after {context}: {err}");
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ForwardStats {
    bytes_read: u64,
    write_failed: bool,
}

struct CountingReader<'a, R> {
    inner: &'a mut R,
    read: u64,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        self.read += count as u64;
        Ok(count)
    }
}

/// Copy child output to the parent; once the parent side closes, keep
/// draining so the child never blocks on a full pipe.
fn forward_child_output<R, W>(mut reader: R, mut writer: W, stream_name: &'static str) -> ForwardStats
where
    R: Read,
    W: Write,
{
    let mut stats = ForwardStats::default();
    let mut counting = CountingReader {
        inner: &mut reader,
        read: 0,
    };
    if let Err(err) = io::copy(&mut counting, &mut writer) {
        stats.write_failed = true;
        debug!("Failed to write child {stream_name} output to parent: {err}; discarding remaining bytes");
        if let Err(drain_err) = io::copy(&mut counting, &mut io::sink()) {
            debug!("Failed to drain child {stream_name} output after writer closed: {drain_err}");
        }
    }
    stats.bytes_read = counting.read;
    stats
}

fn check_exit_status(status: ExitStatus) -> Result<(), RunnerError> {
    if status.success() {
        Ok(())
    } else {
        Err(RunnerError::NinjaFailed {
            status: status.to_string(),
        })
    }
}
