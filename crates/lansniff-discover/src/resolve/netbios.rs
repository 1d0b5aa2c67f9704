//! NetBIOS node status query through `nmblookup -A`.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use lansniff_core::ResolutionStrategy;

use super::NameStrategy;
use crate::command::run_tool;
use crate::error::Result;

pub struct NetBiosQuery {
    command: String,
    limit: Duration,
}

impl NetBiosQuery {
    pub fn new(command: &str, limit: Duration) -> Self {
        Self {
            command: command.to_string(),
            limit,
        }
    }
}

#[async_trait]
impl NameStrategy for NetBiosQuery {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::NetBios
    }

    fn name(&self) -> &'static str {
        "nmblookup"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>> {
        let target = ip.to_string();
        let output = run_tool(&self.command, &["-A", target.as_str()], self.limit).await?;
        Ok(parse_nmblookup(&output))
    }
}

/// Workstation name from `nmblookup -A` output: the leading token of the first
/// unique `<00>` record. Group `<00>` records carry the workgroup, not the host.
pub fn parse_nmblookup(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.contains("<00>"))
        .filter(|line| line.contains("_UNIQUE") || !line.contains("<GROUP>"))
        .find_map(|line| {
            line.split_whitespace()
                .next()
                .filter(|token| !token.starts_with('<'))
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_unique_workstation_name() {
        let output = "\
Looking up status of 192.168.31.20
\tWORKGROUP       <00> - <GROUP> B <ACTIVE>
\tDESKTOP-7QK2    <00> -         B <ACTIVE>
\tDESKTOP-7QK2    <20> -         B <ACTIVE>

\tMAC Address = 00-1C-B3-11-22-33
";
        assert_eq!(parse_nmblookup(output).as_deref(), Some("DESKTOP-7QK2"));
    }

    #[test]
    fn accepts_unique_marker_format() {
        let output = "FILESERVER <00> UNIQUE_UNIQUE Registered\n";
        assert_eq!(parse_nmblookup(output).as_deref(), Some("FILESERVER"));
    }

    #[test]
    fn no_reply() {
        let output = "Looking up status of 192.168.31.21\nNo reply from 192.168.31.21\n";
        assert_eq!(parse_nmblookup(output), None);
    }
}
