//! Line streaming from the CLI process
//!
//! Output is read on dedicated reader tasks and handed to the consumer through
//! an unbounded queue. The consumer waits on the queue for at most one poll
//! interval at a time, so it can notice a process that died without closing
//! its pipes cleanly.
//!
//! Shutdown sequence once the stdout reader is done:
//! 1. reap the process (kill it after `exit_timeout`)
//! 2. join the reader tasks (abort them after `join_timeout`)
//! 3. drain whatever is still queued

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::terminator;
use super::turn::is_turn_completed;
use super::wrapped_child::WrappedChild;
use crate::bridge::LaunchSpec;
use crate::types::{BridgeConfig, BridgeError, Result};

/// Stream of trimmed output lines from the CLI
pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Queue item: `None` marks the end of stdout
type Pumped = Option<String>;

/// Spawn the CLI and stream its output lines
///
/// Spawn failures are returned immediately. The returned stream ends after the
/// process has been reaped; dropping it early aborts the readers and kills the
/// process group.
pub fn spawn_lines(spec: &LaunchSpec, config: &BridgeConfig) -> Result<LineStream> {
    let mut child = WrappedChild::spawn(spec)?;
    let stdout = child
        .take_stdout()
        .ok_or(BridgeError::MissingPipe("stdout"))?;
    let stderr = child.take_stderr();

    tracing::info!(
        pid = child.id(),
        program = %spec.program.display(),
        arg_count = spec.args.len(),
        cwd = ?spec.cwd,
        "Spawned CLI process"
    );

    let child = Arc::new(Mutex::new(child));
    let (tx, rx) = mpsc::unbounded_channel();

    let stdout_task = tokio::spawn(pump(
        Pipe::Stdout,
        stdout,
        tx.clone(),
        Arc::clone(&child),
        config.grace_delay,
    ));
    let stderr_task = match stderr {
        Some(stderr) => Some(tokio::spawn(pump(
            Pipe::Stderr,
            stderr,
            tx,
            Arc::clone(&child),
            config.grace_delay,
        ))),
        None => {
            drop(tx);
            None
        }
    };

    let readers = ReaderTasks {
        stdout: stdout_task,
        stderr: stderr_task,
    };

    Ok(Box::pin(line_stream(child, rx, readers, config.clone())))
}

fn line_stream(
    child: Arc<Mutex<WrappedChild>>,
    mut rx: UnboundedReceiver<Pumped>,
    mut readers: ReaderTasks,
    config: BridgeConfig,
) -> impl Stream<Item = String> + Send {
    async_stream::stream! {
        loop {
            match tokio::time::timeout(config.poll_interval, rx.recv()).await {
                Ok(Some(Some(line))) => {
                    yield line;
                }
                // stdout finished, or every sender is gone
                Ok(Some(None) | None) => break,
                Err(_) => {
                    if readers.stdout.is_finished() && has_exited(&child).await {
                        tracing::debug!("CLI exited while queue was idle");
                        break;
                    }
                }
            }
        }

        match terminator::reap(&child, config.exit_timeout).await {
            Ok(outcome) => tracing::info!(
                outcome = outcome.as_str(),
                exit = ?outcome,
                "CLI process finished"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to reap CLI process"),
        }

        readers.join(config.join_timeout).await;

        while let Ok(pumped) = rx.try_recv() {
            if let Some(line) = pumped {
                yield line;
            }
        }
    }
}

async fn has_exited(child: &Mutex<WrappedChild>) -> bool {
    match child.lock().await.try_wait() {
        Ok(status) => status.is_some(),
        Err(e) => {
            tracing::debug!(error = %e, "try_wait failed, treating CLI as exited");
            true
        }
    }
}

/// Which pipe a reader task is draining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

impl Pipe {
    fn as_str(self) -> &'static str {
        match self {
            Pipe::Stdout => "stdout",
            Pipe::Stderr => "stderr",
        }
    }
}

/// Forward one pipe into the queue, watching for the end of the turn
///
/// Either pipe can carry `turn.completed`. Only the stdout reader marks the
/// end of output when it stops.
async fn pump<R>(
    pipe: Pipe,
    output: R,
    tx: UnboundedSender<Pumped>,
    child: Arc<Mutex<WrappedChild>>,
    grace: Duration,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();

    loop {
        match next_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                tracing::trace!(pipe = pipe.as_str(), line = %line, "CLI output");
                let completed = is_turn_completed(&line);
                if tx.send(Some(line)).is_err() {
                    return;
                }
                if completed {
                    tracing::debug!(
                        pipe = pipe.as_str(),
                        grace_ms = grace.as_millis(),
                        "Turn completed, shutting down CLI"
                    );
                    terminator::terminate_after_grace(&child, grace).await;
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(pipe = pipe.as_str(), error = %e, "Failed to read CLI output");
                break;
            }
        }
    }

    if pipe == Pipe::Stdout {
        drop(tx.send(None));
    }
}

/// Read one line, decoded lossily and trimmed; `None` at EOF
async fn next_line<R>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).trim().to_string()))
}

/// Reader tasks owned by a line stream
///
/// Dropping aborts them, which releases their handle on the child so
/// kill-on-drop can take the process group down.
#[derive(Debug)]
struct ReaderTasks {
    stdout: JoinHandle<()>,
    stderr: Option<JoinHandle<()>>,
}

impl ReaderTasks {
    async fn join(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let handles = std::iter::once(&mut self.stdout).chain(self.stderr.as_mut());

        for handle in handles {
            match tokio::time::timeout_at(deadline, &mut *handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "CLI reader task failed"),
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis(),
                        "CLI reader task did not finish in time, aborting"
                    );
                    handle.abort();
                }
            }
        }
    }
}

impl Drop for ReaderTasks {
    fn drop(&mut self) {
        self.stdout.abort();
        if let Some(stderr) = &self.stderr {
            stderr.abort();
        }
    }
}
