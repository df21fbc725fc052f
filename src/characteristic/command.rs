//! Remote command execution.
//!
//! Commands run through `bash -c` with no authentication, so the
//! characteristic only executes when the operator opts in with
//! `--enable-command-execution`.

use async_trait::async_trait;
use tokio::process::Command;

/// Runs a command string and returns its captured output.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, command: &str) -> std::io::Result<Vec<u8>>;
}

/// Runs commands with `bash -c`.
///
/// Output is stdout followed by stderr. The exit status is not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> std::io::Result<Vec<u8>> {
        let output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await?;

        let mut captured = output.stdout;
        captured.extend_from_slice(&output.stderr);
        Ok(captured)
    }
}
