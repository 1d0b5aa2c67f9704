//! External tool runner.
//!
//! Every command the scanner shells out to (`arp`, `nslookup`, `nmblookup`,
//! `ping`) goes through [`run_tool`], which bounds it with a timeout and kills
//! the child if the caller stops waiting.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{DiscoverError, Result};

/// Run `program args...` and return its stdout.
///
/// A missing binary maps to [`DiscoverError::CommandNotFound`], a non-zero
/// exit to [`DiscoverError::CommandFailed`], and an overrun to
/// [`DiscoverError::Timeout`].
pub async fn run_tool(program: &str, args: &[&str], limit: Duration) -> Result<String> {
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).kill_on_drop(true);

    let output = match timeout(limit, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DiscoverError::CommandNotFound {
                command: program.to_string(),
            });
        }
        Ok(Err(e)) => return Err(DiscoverError::Io(e)),
        Err(_) => {
            return Err(DiscoverError::Timeout {
                millis: limit.as_millis(),
            });
        }
    };

    if !output.status.success() {
        return Err(DiscoverError::CommandFailed {
            command: program.to_string(),
            code: output.status.code().unwrap_or(-1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let err = run_tool("lansniff-no-such-tool", &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoverError::CommandNotFound { .. }));
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let out = run_tool("echo", &["hello"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let err = run_tool("sh", &["-c", "exit 3"], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoverError::CommandFailed { code: 3, .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn overrun_times_out() {
        let start = std::time::Instant::now();
        let err = run_tool("sleep", &["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoverError::Timeout { millis: 100 }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
