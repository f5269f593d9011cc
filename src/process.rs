//! Child process invocation.
//!
//! One function: spawn the external tool with an argument vector, capture
//! stdout and stderr separately, optionally feed a byte buffer to stdin,
//! wait for exit. Exit-status interpretation belongs to the caller; the
//! tool writes diagnostic records to stdout even when it fails, so a bare
//! non-zero status is never the whole story.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Captured streams and exit status of one finished child process.
#[derive(Debug)]
pub struct CmdOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: std::process::ExitStatus,
}

impl CmdOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Spawn `program` with `args` and drive it to completion.
///
/// When `stdin` is `Some`, the bytes are written to the child's stdin and
/// the pipe is closed before waiting; the child blocks until it sees
/// end-of-input. A child that exits without reading its stdin (broken
/// pipe) is not an error here — its own captured diagnostics say more
/// than the write failure would.
///
/// Fails with [`Error::Launch`] when the process cannot start at all.
pub async fn run_capture(
    program: &str,
    args: &[String],
    stdin: Option<&[u8]>,
) -> Result<CmdOutput> {
    debug!(program, ?args, "spawning child process");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| Error::Launch {
        program: program.to_string(),
        source,
    })?;

    let mut stdin_failure = None;
    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            if let Err(err) = pipe.write_all(input).await {
                stdin_failure = Some(err);
            }
            // Dropping the handle closes the pipe and signals end-of-input.
        }
    }

    let output = child.wait_with_output().await?;

    if let Some(err) = stdin_failure {
        if err.kind() == std::io::ErrorKind::BrokenPipe {
            warn!(program, "child closed stdin before reading the full input");
        } else {
            return Err(Error::Io(err));
        }
    }

    debug!(program, status = ?output.status, stdout_len = output.stdout.len(),
        stderr_len = output.stderr.len(), "child exited");

    Ok(CmdOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        status: output.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_a_launch_error() {
        let err = run_capture("definitely-not-a-real-binary-xyz", &[], None)
            .await
            .unwrap_err();
        match err {
            Error::Launch { program, .. } => {
                assert_eq!(program, "definitely-not-a-real-binary-xyz");
            }
            other => panic!("expected Launch error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_streams_and_status_separately() {
        let args = vec![
            "-c".to_string(),
            "echo out-line; echo err-line 1>&2; exit 3".to_string(),
        ];
        let out = run_capture("sh", &args, None).await.unwrap();
        assert_eq!(out.stdout_text(), "out-line\n");
        assert_eq!(out.stderr_text(), "err-line\n");
        assert_eq!(out.status.code(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_is_written_and_closed() {
        let args = vec!["-c".to_string(), "cat".to_string()];
        let out = run_capture("sh", &args, Some(b"spec body\n")).await.unwrap();
        assert_eq!(out.stdout_text(), "spec body\n");
        assert!(out.status.success());
    }
}
