use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::{AppError, Result};

/// Lines of each stream kept for error messages.
const TAIL_LINES: usize = 20;

/// Exit status of an external command plus the last lines it printed.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout_tail: Vec<String>,
    pub stderr_tail: Vec<String>,
}

impl CommandOutput {
    /// Last non-empty stderr line, falling back to stdout, for log messages.
    pub fn summary(&self) -> &str {
        [&self.stderr_tail, &self.stdout_tail]
            .into_iter()
            .flat_map(|tail| tail.iter().rev())
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}

/// Run `program args...` in `work_dir`, killing it if `timeout` elapses.
pub async fn run(
    program: &str,
    args: &[&str],
    work_dir: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    run_command(cmd, work_dir, timeout, program).await
}

/// Run `command_line` through `sh -c` in `work_dir`.
///
/// Only the first word of the line is logged; the rest may carry credentials.
pub async fn run_shell(
    command_line: &str,
    work_dir: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    let label = command_line.split_whitespace().next().unwrap_or("sh");
    run_command(cmd, work_dir, timeout, label).await
}

/// Output is streamed line by line into the log as it arrives, inside the
/// caller's span, and only a bounded tail is retained.
async fn run_command(
    mut cmd: Command,
    work_dir: &Path,
    timeout: Duration,
    label: &str,
) -> Result<CommandOutput> {
    cmd.current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = %label, dir = %work_dir.display(), "Running command");

    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let work = async {
        let (stdout_tail, stderr_tail, status) = tokio::join!(
            drain(stdout, label, "stdout"),
            drain(stderr, label, "stderr"),
            child.wait()
        );
        Ok::<_, std::io::Error>((stdout_tail, stderr_tail, status?))
    };

    // on timeout the child is dropped, and killed, when this function returns
    let (stdout_tail, stderr_tail, status) = match tokio::time::timeout(timeout, work).await {
        Ok(result) => result?,
        Err(_elapsed) => {
            return Err(AppError::Timeout(format!(
                "`{label}` did not finish within {timeout:?}"
            )));
        }
    };

    Ok(CommandOutput {
        success: status.success(),
        exit_code: status.code().unwrap_or(-1),
        stdout_tail: stdout_tail.into(),
        stderr_tail: stderr_tail.into(),
    })
}

async fn drain<R: AsyncRead + Unpin>(
    reader: Option<R>,
    label: &str,
    stream: &'static str,
) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(TAIL_LINES);
    let Some(reader) = reader else {
        return tail;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                tracing::info!(command = %label, stream, "{line}");
                if tail.len() == TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Err(e) => {
                tracing::warn!(command = %label, stream, error = %e, "Failed to read command output");
                break;
            }
        }
    }
    tail
}
