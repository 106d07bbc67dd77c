//! Subprocess execution seam for extraction tools

use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// Windows flag to hide console window
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Captured result of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Most useful diagnostic text of a failed run
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.status_code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs an external program to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// `Err` means the program could not be started or timed out; a program
    /// that ran and failed is an `Ok` with `success == false`.
    async fn run(&self, program: &Path, args: &[OsString], timeout: Duration) -> io::Result<ToolOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    output_limit: usize,
}

impl TokioProcessRunner {
    pub fn new(output_limit: usize) -> Self {
        Self { output_limit }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &Path, args: &[OsString], timeout: Duration) -> io::Result<ToolOutput> {
        debug!("Running {} {:?}", program.display(), args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.output_limit as u64;

        let completion = async {
            let (stdout, stderr, status) = tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait()
            );
            Ok::<_, io::Error>((stdout?, stderr?, status?))
        };

        match tokio::time::timeout(timeout, completion).await {
            Ok(result) => {
                let (stdout, stderr, status) = result?;
                Ok(ToolOutput {
                    success: status.success(),
                    status_code: status.code(),
                    stdout,
                    stderr,
                })
            }
            // The child is killed when it is dropped on return
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} timed out after {:?}", program.display(), timeout),
            )),
        }
    }
}

/// Keep the first `limit` bytes of a stream and drain the rest so the child
/// never blocks on a full pipe
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, limit: u64) -> io::Result<String> {
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    (&mut reader).take(limit).read_to_end(&mut buf).await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = TokioProcessRunner::new(1024);
        let output = runner
            .run(Path::new("/bin/sh"), &shell("echo out; echo err 1>&2; exit 3"), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.status_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.error_text(), "err");
    }

    #[tokio::test]
    async fn test_output_is_capped() {
        let runner = TokioProcessRunner::new(4);
        let output = runner
            .run(Path::new("/bin/sh"), &shell("echo 0123456789"), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout, "0123");
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let runner = TokioProcessRunner::new(1024);
        let err = runner
            .run(Path::new("/bin/sh"), &shell("sleep 5"), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_start() {
        let runner = TokioProcessRunner::new(1024);
        let result = runner
            .run(Path::new("/nonexistent/7za"), &[], Duration::from_secs(1))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_error_text_falls_back_to_exit_code() {
        let output = ToolOutput {
            success: false,
            status_code: Some(2),
            ..Default::default()
        };
        assert_eq!(output.error_text(), "exited with code 2");
    }
}
