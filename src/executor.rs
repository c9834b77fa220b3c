//! Subprocess execution.
//!
//! Every case is one command line handed to a shell, exactly one process at a time. The wall
//! clock limit covers the whole exchange: process exit *and* draining of stdout/stderr. A
//! process that outlives it is terminated, then killed unconditionally, and its results are
//! replaced with the timeout sentinel (exit code 69 and `Command timed out` on stderr by
//! default).

use crate::config::Config;
use crate::error::Error;
use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

/// Message substituted for stderr when a case is killed on timeout.
pub const TIMED_OUT_MESSAGE: &str = "Command timed out";

/// What a single client run produced.
#[serde_as]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Process exit code. Negative values are the number of the signal that ended the process.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl Outcome {
    #[must_use]
    pub fn timed_out(exit_code: i32, elapsed: Duration) -> Self {
        Outcome {
            exit_code,
            stdout: String::new(),
            stderr: TIMED_OUT_MESSAGE.to_string(),
            elapsed,
            timed_out: true,
        }
    }
}

/// `DynExecutor` is a type alias for an [`Executor`] shared between the runner and its callers.
pub type DynExecutor = Arc<dyn Executor + Send + Sync>;

/// An async trait describing how a command line is run and observed.
#[async_trait::async_trait]
pub trait Executor {
    /// Run `command` to completion, or until `timeout` elapses.
    ///
    /// Only failures to start the command are errors; nonzero exits and timeouts are reported
    /// through the [`Outcome`].
    async fn execute(&self, command: &str, timeout: Duration) -> Result<Outcome, Error>;
}

/// Runs command lines through `<shell> -c`, so pipes and redirections in a case work.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ShellExecutor {
    shell: String,
    timeout_exit_code: i32,
}

impl ShellExecutor {
    #[must_use]
    pub fn new(shell: impl Into<String>, timeout_exit_code: i32) -> Self {
        ShellExecutor {
            shell: shell.into(),
            timeout_exit_code,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.shell.clone(), config.timeout_exit_code)
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout reaches whatever the shell started.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[async_trait::async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<Outcome, Error> {
        let started = Instant::now();
        let mut child = self.command(command).spawn().map_err(|source| Error::Spawn {
            shell: self.shell.clone(),
            source,
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let exchange = async {
            tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        };
        let finished = tokio::time::timeout(timeout, exchange).await;
        match finished {
            Ok((status, stdout, stderr)) => Ok(Outcome {
                exit_code: exit_code(status?),
                stdout: String::from_utf8_lossy(&stdout?).into_owned(),
                stderr: String::from_utf8_lossy(&stderr?).into_owned(),
                elapsed: started.elapsed(),
                timed_out: false,
            }),
            Err(_) => {
                tracing::debug!("\"{command}\" exceeded {timeout:?}, killing");
                terminate(&mut child).await;
                Ok(Outcome::timed_out(self.timeout_exit_code, started.elapsed()))
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = vec![];
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// SIGTERM then SIGKILL to the whole process group, then kill and reap the shell itself.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pgid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) {
        signal_group(pgid, libc::SIGTERM);
        signal_group(pgid, libc::SIGKILL);
    }
    if let Err(err) = child.kill().await {
        tracing::debug!("kill after timeout: {err}");
    }
}

/// Send `signal` to process group `pgid`. A group that is already gone (`ESRCH`) is not
/// worth reporting; any other failure is logged.
#[cfg(unix)]
fn signal_group(pgid: libc::pid_t, signal: libc::c_int) {
    // SAFETY: kill(2) with a negative pid only signals the group created for this child.
    if unsafe { libc::kill(-pgid, signal) } == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::debug!("signal {signal} to process group {pgid}: {err}");
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
