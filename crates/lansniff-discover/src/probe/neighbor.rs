//! Passive discovery from the OS neighbor (ARP) cache.
//!
//! Sends nothing on the wire. Results only reflect what the OS already has
//! cached, so they can be stale or incomplete.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lansniff_core::{AddressRange, DiscoveredDevice, MacAddress};

use super::{AddressSource, Discovery};
use crate::command::run_tool;
use crate::error::{DiscoverError, Result};

/// Reads `arp -a` (or a compatible command).
pub struct NeighborTable {
    command: String,
    args: Vec<String>,
    limit: Duration,
}

impl NeighborTable {
    pub fn new(command: &str, args: Vec<String>, limit: Duration) -> Self {
        Self {
            command: command.to_string(),
            args,
            limit,
        }
    }
}

#[async_trait]
impl AddressSource for NeighborTable {
    fn name(&self) -> &'static str {
        "neighbor-table"
    }

    async fn discover(&self, range: &AddressRange) -> Result<Discovery> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        let output = run_tool(&self.command, &args, self.limit).await?;
        if !is_recognisable(&output) {
            return Err(DiscoverError::ParseMismatch {
                source_name: self.command.clone(),
                detail: "no neighbor entries in output".to_string(),
            });
        }

        let devices: Vec<DiscoveredDevice> = parse_neighbor_table(&output)
            .into_iter()
            .filter(|d| range.contains(d.address))
            .collect();

        tracing::debug!(
            command = %self.command,
            entries = devices.len(),
            range = %range,
            "Read neighbor table"
        );

        Ok(Discovery::new(self.name(), devices))
    }
}

/// Parse every recognisable entry of a neighbor table dump.
///
/// Understands BSD/Linux `arp -a` (`? (10.0.0.1) at aa:bb:... on en0`),
/// `ip neigh` (`10.0.0.1 dev eth0 lladdr aa:bb:... REACHABLE`) and Windows
/// `arp -a` (`10.0.0.1   aa-bb-...   dynamic`). Anything else is skipped.
pub fn parse_neighbor_table(output: &str) -> Vec<DiscoveredDevice> {
    output.lines().filter_map(parse_neighbor_line).collect()
}

/// Empty output is an empty table. Non-empty output must name at least one
/// address, even if every entry is incomplete.
pub fn is_recognisable(output: &str) -> bool {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty()).peekable();
    lines.peek().is_none() || lines.any(|l| entry_address(l).is_some())
}

fn entry_address(line: &str) -> Option<Ipv4Addr> {
    match (line.find('('), line.find(')')) {
        (Some(open), Some(close)) if open < close => line[open + 1..close].trim().parse().ok(),
        _ => line.split_whitespace().next()?.parse().ok(),
    }
}

fn parse_neighbor_line(line: &str) -> Option<DiscoveredDevice> {
    let (address, hw_token) = match (line.find('('), line.find(')')) {
        (Some(open), Some(close)) if open < close => {
            let address: Ipv4Addr = line[open + 1..close].trim().parse().ok()?;
            let rest: Vec<&str> = line[close + 1..].split_whitespace().collect();
            let at = rest.iter().position(|t| *t == "at")?;
            (address, *rest.get(at + 1)?)
        }
        _ => {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let address: Ipv4Addr = tokens.first()?.parse().ok()?;
            let hw = match tokens.iter().position(|t| *t == "lladdr") {
                Some(i) => *tokens.get(i + 1)?,
                None => *tokens.get(1)?,
            };
            (address, hw)
        }
    };

    let mac: MacAddress = hw_token.parse().ok()?;
    if mac.is_unspecified() || mac.is_broadcast() {
        return None;
    }

    Some(DiscoveredDevice::new(address, mac))
}
