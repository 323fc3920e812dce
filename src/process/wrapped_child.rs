//! Wrapped child process with process group support
//!
//! The CLI is spawned as a process group leader (job object on Windows) with
//! kill-on-drop, so tearing down the wrapper also tears down anything the CLI
//! started.

use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use process_wrap::tokio::{ChildWrapper, CommandWrap, KillOnDrop};
#[cfg(windows)]
use process_wrap::tokio::JobObject;
#[cfg(unix)]
use process_wrap::tokio::ProcessGroup;
use tokio::process::{ChildStderr, ChildStdout, Command};

use crate::bridge::LaunchSpec;
use crate::types::{BridgeError, Result};

/// Wrapper around Box<dyn ChildWrapper> that provides
/// a stable interface compatible with Arc<Mutex<>>
///
/// The reader task and the consumer both need the child: one to terminate it
/// on turn completion, the other to poll liveness and reap it.
#[derive(Debug)]
pub struct WrappedChild {
    inner: Box<dyn ChildWrapper>,
}

impl WrappedChild {
    /// Create a new wrapped child from a process-wrap ChildWrapper
    pub fn new(inner: Box<dyn ChildWrapper>) -> Self {
        Self { inner }
    }

    /// Spawn the command described by `spec` with piped stdout/stderr
    /// and a null stdin.
    pub fn spawn(spec: &LaunchSpec) -> Result<Self> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let mut wrapped = CommandWrap::from(command);
        #[cfg(unix)]
        wrapped.wrap(ProcessGroup::leader());
        #[cfg(windows)]
        wrapped.wrap(JobObject);
        wrapped.wrap(KillOnDrop);

        let inner = wrapped
            .spawn()
            .map_err(|e| BridgeError::spawn_failed(spec.program.display().to_string(), e))?;

        Ok(Self::new(inner))
    }

    /// Take ownership of the stdout pipe
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.inner.stdout().take()
    }

    /// Take ownership of the stderr pipe
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.inner.stderr().take()
    }

    /// Kill the process group and wait for exit
    ///
    /// This will terminate the entire process group, not just the parent process.
    pub async fn kill(&mut self) -> io::Result<()> {
        Pin::from(self.inner.kill()).await
    }

    /// Start killing without waiting for exit
    pub fn start_kill(&mut self) -> io::Result<()> {
        self.inner.start_kill()
    }

    /// Wait for the process to exit
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        Pin::from(self.inner.wait()).await
    }

    /// Try to wait without blocking
    ///
    /// Returns Some(status) if the process has exited, None if still running.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.inner.try_wait()
    }

    /// Send a specific signal to the process group (Unix only)
    ///
    /// # Arguments
    /// * `sig` - Signal number (e.g., libc::SIGTERM, libc::SIGKILL)
    #[cfg(unix)]
    pub fn signal(&self, sig: i32) -> io::Result<()> {
        self.inner.signal(sig)
    }

    /// Get the process ID
    pub fn id(&self) -> u32 {
        self.inner.id().unwrap_or(0)
    }
}
