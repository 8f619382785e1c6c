//! Blocking subprocess execution with a wall-clock limit.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for a pipe to close once the child has exited.
/// Grandchildren that inherited the pipe can hold it open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Why a subprocess did not finish successfully.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed waiting on {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let mut output = String::new();
        if let Some(mut pipe) = pipe {
            if let Err(err) = pipe.read_to_string(&mut output) {
                output.push_str(&format!("<failed to read pipe: {err}>"));
            }
        }
        // The receiver is gone once the grace period has passed.
        let _ = tx.send(output);
    });
    rx
}

fn collect(output: &Receiver<String>, program: &str, pipe: &'static str) -> String {
    output.recv_timeout(DRAIN_GRACE).unwrap_or_else(|_| {
        tracing::warn!(program, pipe, "Pipe still open after exit, output dropped");
        format!("<{pipe} still open after exit>")
    })
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// stdout and stderr are drained on their own threads so a chatty child
/// never blocks on a full pipe.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let program = program_name(&cmd);
    tracing::debug!(program = %program, args = ?cmd.get_args().collect::<Vec<_>>(), "Running subprocess");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout_task = drain(child.stdout.take());
    let stderr_task = drain(child.stderr.take());

    let status = wait_with_deadline(&mut child, &program, timeout);

    let stdout = collect(&stdout_task, &program, "stdout");
    let stderr = collect(&stderr_task, &program, "stderr");

    let status = status?;
    if !status.success() {
        return Err(ProcessError::Failed {
            program,
            status,
            stderr: last_lines(&stderr, 20),
        });
    }
    Ok(ProcessOutput { stdout, stderr })
}

fn wait_with_deadline(
    child: &mut Child,
    program: &str,
    timeout: Duration,
) -> Result<ExitStatus, ProcessError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if started.elapsed() >= timeout => {
                tracing::warn!(program, timeout_secs = timeout.as_secs(), "Subprocess timed out, killing");
                if let Err(err) = child.kill() {
                    tracing::warn!(program, error = %err, "Failed to kill subprocess");
                }
                let _ = child.wait();
                return Err(ProcessError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                return Err(ProcessError::Wait {
                    program: program.to_string(),
                    source,
                })
            }
        }
    }
}

/// Keep the tail of a long stderr dump for error messages.
pub fn last_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(max);
    lines[start..].join("\n")
}

/// Whether `binary` resolves on `PATH` (or is an existing path).
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return std::path::Path::new(binary).is_file();
    }
    Command::new("which")
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
