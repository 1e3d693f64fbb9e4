//! Cancelable engine subprocess runs.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::LintError;
use crate::cancel::CancelSignal;

/// How long a terminated engine gets to exit before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Captured output of a finished subprocess.
#[derive(Debug)]
pub(crate) struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Result of a subprocess run.
#[derive(Debug)]
pub(crate) enum ProcessRun {
    Exited(Captured),
    Canceled,
}

/// Spawns `command`, feeds it `input` (then closes stdin), drains stdout
/// and stderr up to `limit` bytes each, and waits for exit.
///
/// Once `cancel` fires the process is terminated and nothing it wrote is
/// reported.
pub(crate) async fn run(
    mut command: Command,
    program: &str,
    input: Option<&str>,
    limit: usize,
    cancel: &CancelSignal,
) -> Result<ProcessRun, LintError> {
    if cancel.is_cancelled() {
        return Ok(ProcessRun::Canceled);
    }
    if input.is_some() {
        command.stdin(Stdio::piped());
    }

    let mut child = command
        .spawn()
        .map_err(|e| LintError::spawn(program, e))?;
    debug!("Spawned {} (pid {:?})", program, child.id());

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let io = async {
        let write = async {
            if let (Some(mut pipe), Some(input)) = (stdin, input) {
                // The engine may exit before reading everything (e.g. on a
                // bad flag); its exit code is what gets reported then.
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    debug!("Engine closed stdin early: {}", e);
                } else if let Err(e) = pipe.shutdown().await {
                    debug!("Failed to close engine stdin: {}", e);
                }
            }
        };
        let (_, stdout, stderr) =
            tokio::join!(write, read_capped(stdout, limit), read_capped(stderr, limit));
        Ok::<_, LintError>((stdout?, stderr?))
    };

    let (stdout, stderr) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            terminate(&mut child, program).await;
            return Ok(ProcessRun::Canceled);
        }
        output = io => match output {
            Ok(output) => output,
            Err(e) => {
                terminate(&mut child, program).await;
                return Err(e);
            }
        },
    };

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            terminate(&mut child, program).await;
            return Ok(ProcessRun::Canceled);
        }
        status = child.wait() => status?,
    };

    if cancel.is_cancelled() {
        return Ok(ProcessRun::Canceled);
    }

    Ok(ProcessRun::Exited(Captured {
        status,
        stdout,
        stderr,
    }))
}

async fn read_capped<R>(pipe: Option<R>, limit: usize) -> Result<String, LintError>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    pipe.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(LintError::OutputTooLarge { limit });
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Asks the process to terminate, then kills it after a grace period.
async fn terminate(child: &mut Child, program: &str) {
    // `id()` is `None` once the exit status was collected.
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!("Failed to signal {}: {}", program, e);
        }
    }
    #[cfg(not(unix))]
    if let Err(e) = child.start_kill() {
        debug!("Failed to kill {}: {}", program, e);
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(_) => debug!("Terminated {}", program),
        Err(_) => {
            warn!("{} ignored termination, killing it", program);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill {}: {}", program, e);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::fake_engine;
    use std::time::Instant;

    fn command(path: &std::path::Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    #[tokio::test]
    async fn captures_output_and_echoes_stdin() {
        let engine = fake_engine("cat; echo err >&2; exit 1");
        let run = run(
            command(engine.path(), &[]),
            "fake",
            Some("hello"),
            1024,
            &CancelSignal::new(),
        )
        .await
        .unwrap();

        let ProcessRun::Exited(captured) = run else {
            panic!("expected exit");
        };
        assert_eq!(captured.stdout, "hello");
        assert_eq!(captured.stderr.trim(), "err");
        assert_eq!(captured.status.code(), Some(1));
    }

    #[tokio::test]
    async fn cancel_terminates_running_process() {
        let engine = fake_engine("exec sleep 30");
        let cancel = CancelSignal::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let run = run(command(engine.path(), &[]), "fake", None, 1024, &cancel)
            .await
            .unwrap();

        assert!(matches!(run, ProcessRun::Canceled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancelled_before_spawn_never_starts() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        let run = run(
            command(std::path::Path::new("/nonexistent/engine"), &[]),
            "fake",
            None,
            1024,
            &cancel,
        )
        .await
        .unwrap();
        assert!(matches!(run, ProcessRun::Canceled));
    }

    #[tokio::test]
    async fn output_over_limit_fails() {
        let engine = fake_engine("printf '0123456789abcdef'");
        let err = run(command(engine.path(), &[]), "fake", None, 8, &CancelSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LintError::OutputTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let err = run(
            command(std::path::Path::new("/nonexistent/engine"), &[]),
            "/nonexistent/engine",
            None,
            1024,
            &CancelSignal::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LintError::Spawn { .. }));
    }
}
