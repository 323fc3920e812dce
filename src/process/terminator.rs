//! Graceful shutdown of the CLI process group
//!
//! Termination is two-phase: a polite request (SIGTERM to the group on Unix)
//! once the turn is over, then a bounded wait for exit that escalates to a
//! kill.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::WrappedChild;

/// How often `reap` re-checks a process that has not exited yet
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How the CLI process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Process exited on its own with an exit code
    Exited(i32),
    /// Process ended because of a signal (usually our SIGTERM)
    Signalled,
    /// Process outlived the exit timeout and was killed
    Killed,
}

impl ExitOutcome {
    /// Get status string for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exited(_) => "exited",
            Self::Signalled => "signalled",
            Self::Killed => "killed",
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::Exited(code),
            None => Self::Signalled,
        }
    }
}

/// Ask the process to exit
///
/// Sends SIGTERM to the whole process group on Unix; elsewhere there is no
/// polite equivalent, so the process is killed. Does nothing if the process
/// has already exited.
pub async fn request_termination(child: &Mutex<WrappedChild>) -> io::Result<()> {
    let mut child = child.lock().await;
    if child.try_wait()?.is_some() {
        return Ok(());
    }

    tracing::debug!(pid = child.id(), "Requesting CLI termination");

    #[cfg(unix)]
    {
        child.signal(libc::SIGTERM)
    }

    #[cfg(not(unix))]
    {
        child.start_kill()
    }
}

/// Wait out the grace delay, then ask the process to exit
///
/// The delay gives the CLI a chance to flush trailing events (session
/// bookkeeping, stats) written after `turn.completed`.
pub async fn terminate_after_grace(child: &Mutex<WrappedChild>, grace: Duration) {
    tokio::time::sleep(grace).await;
    if let Err(e) = request_termination(child).await {
        tracing::warn!(error = %e, "Failed to request CLI termination");
    }
}

/// Wait for the process to exit, killing it if it takes longer than `exit_timeout`
pub async fn reap(child: &Mutex<WrappedChild>, exit_timeout: Duration) -> io::Result<ExitOutcome> {
    let mut child = child.lock().await;
    let deadline = Instant::now() + exit_timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }
        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(REAP_POLL_INTERVAL).await;
    }

    tracing::warn!(
        pid = child.id(),
        timeout_ms = exit_timeout.as_millis(),
        "CLI did not exit in time, killing process group"
    );
    child.kill().await?;
    Ok(ExitOutcome::Killed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_outcome_as_str() {
        assert_eq!(ExitOutcome::Exited(0).as_str(), "exited");
        assert_eq!(ExitOutcome::Signalled.as_str(), "signalled");
        assert_eq!(ExitOutcome::Killed.as_str(), "killed");
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use crate::bridge::LaunchSpec;
        use std::path::PathBuf;

        fn spawn_sh(script: &str) -> Mutex<WrappedChild> {
            let spec = LaunchSpec {
                program: PathBuf::from("sh"),
                args: vec!["-c".to_string(), script.to_string()],
                cwd: None,
            };
            Mutex::new(WrappedChild::spawn(&spec).unwrap())
        }

        #[tokio::test]
        async fn test_reap_normal_exit() {
            let child = spawn_sh("exit 3");
            let outcome = reap(&child, Duration::from_secs(5)).await.unwrap();
            assert_eq!(outcome, ExitOutcome::Exited(3));
        }

        #[tokio::test]
        async fn test_request_termination_then_reap() {
            let child = spawn_sh("sleep 30");
            request_termination(&child).await.unwrap();
            let outcome = reap(&child, Duration::from_secs(5)).await.unwrap();
            assert_ne!(outcome, ExitOutcome::Killed);
        }

        #[tokio::test]
        async fn test_reap_kills_after_timeout() {
            let child = spawn_sh("sleep 30");
            let started = std::time::Instant::now();

            let outcome = reap(&child, Duration::from_millis(300)).await.unwrap();

            assert_eq!(outcome, ExitOutcome::Killed);
            assert!(started.elapsed() < Duration::from_secs(10));
        }
    }
}
