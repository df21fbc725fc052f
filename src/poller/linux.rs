//! Status sampling with the classic `iwconfig` / `ifconfig` tools.

use super::{SampleError, StatusKind, SystemStatusProvider};
use async_trait::async_trait;
use tokio::process::Command;

/// Samples a wireless interface by running `iwconfig` and `ifconfig`.
#[derive(Debug, Clone)]
pub struct LinuxStatusProvider {
    interface: String,
}

impl LinuxStatusProvider {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    async fn run(&self, program: &str) -> Result<String, SampleError> {
        // Dropped on poller cancellation or sample timeout
        let output = Command::new(program)
            .arg(&self.interface)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl SystemStatusProvider for LinuxStatusProvider {
    async fn sample(&self, kind: StatusKind) -> Result<String, SampleError> {
        let value = match kind {
            StatusKind::NetworkName => parse_essid(&self.run("iwconfig").await?),
            StatusKind::InterfaceAddress => parse_inet(&self.run("ifconfig").await?),
        };
        value.ok_or(SampleError::NoMatch(kind))
    }
}

/// Extract the quoted `ESSID:"…"` value from `iwconfig` output.
pub fn parse_essid(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.rfind("ESSID:\"")? + "ESSID:\"".len();
        let rest = &line[start..];
        let end = rest.rfind('"')?;
        Some(rest[..end].to_string())
    })
}

/// Extract the first `inet` or `inet6` address from `ifconfig` output.
pub fn parse_inet(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "inet" || token == "inet6" {
                return tokens.next().map(str::to_string);
            }
        }
        None
    })
}
