//! Name-service query through the `nslookup` tool.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lansniff_core::ResolutionStrategy;

use super::NameStrategy;
use crate::command::run_tool;
use crate::error::Result;

pub struct NameServiceQuery {
    command: String,
    limit: Duration,
}

impl NameServiceQuery {
    pub fn new(command: &str, limit: Duration) -> Self {
        Self {
            command: command.to_string(),
            limit,
        }
    }
}

#[async_trait]
impl NameStrategy for NameServiceQuery {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::NameService
    }

    fn name(&self) -> &'static str {
        "nslookup"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>> {
        let target = ip.to_string();
        let output = run_tool(&self.command, &[target.as_str()], self.limit).await?;
        Ok(parse_nslookup(&output))
    }
}

/// First `name = host.` answer in `nslookup` output, without the root dot.
pub fn parse_nslookup(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (_, name) = line.split_once("name =")?;
        let name = name.trim().trim_end_matches('.');
        (!name.is_empty()).then(|| name.to_string())
    })
}
