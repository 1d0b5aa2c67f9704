//! Reserved last step of the hostname chain.
//!
//! Sends a single ping and records reachability in the trace log. It never
//! produces a name; it holds the slot for a future echo-based lookup.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lansniff_core::ResolutionStrategy;

use super::NameStrategy;
use crate::command::run_tool;
use crate::error::Result;

pub struct EchoProbe {
    command: String,
    limit: Duration,
}

impl EchoProbe {
    pub fn new(command: &str, limit: Duration) -> Self {
        Self {
            command: command.to_string(),
            limit,
        }
    }
}

#[async_trait]
impl NameStrategy for EchoProbe {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::None
    }

    fn name(&self) -> &'static str {
        "echo"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>> {
        let target = ip.to_string();
        match run_tool(&self.command, &["-c", "1", "-W", "1", target.as_str()], self.limit).await {
            Ok(_) => tracing::trace!(ip = %ip, "Echo reply received"),
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => tracing::trace!(ip = %ip, error = %e, "No echo reply"),
        }
        Ok(None)
    }
}
