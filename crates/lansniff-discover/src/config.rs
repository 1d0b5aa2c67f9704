//! Configuration for a lansniff scan.

use std::time::Duration;

use lansniff_core::AddressRange;
use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Top-level scan configuration.
///
/// Loaded from the `lansniff.toml` `[scan]` section or `LANSNIFF_SCAN__`
/// environment variables, then overridden by command-line flags.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Subnet to scan in CIDR notation (a bare address scans a single host).
    #[serde(default = "default_range")]
    pub range: String,

    /// Hard limit for resolving one host's name, all strategies included.
    #[serde(default = "default_per_host_timeout")]
    pub per_host_timeout_secs: u64,

    /// Limit for a single strategy or external command.
    #[serde(default = "default_strategy_timeout")]
    pub strategy_timeout_secs: u64,

    /// Maximum concurrent hostname resolutions.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How the report is rendered.
    #[serde(default)]
    pub mode: ReportMode,

    /// How long the ARP prober listens for replies.
    #[serde(default = "default_probe_wait")]
    pub probe_wait_ms: u64,

    /// Which discovery source(s) to use.
    #[serde(default)]
    pub discovery: DiscoveryMode,

    /// Interface to probe from. Picked automatically when unset.
    #[serde(default)]
    pub interface: Option<String>,

    /// Paths of the external tools used for discovery and resolution.
    #[serde(default)]
    pub tools: ToolPaths,

    /// Run the reserved echo probe at the end of the hostname chain.
    #[serde(default = "default_true")]
    pub echo_probe: bool,

    /// Optional manuf-style file layered over the built-in vendor table.
    #[serde(default)]
    pub oui_file: Option<String>,
}

/// Output layout for the final report.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// One fixed-width row per device.
    #[default]
    Summary,
    /// One multi-line block per device.
    Detailed,
}

/// Discovery source selection, made once at startup.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Active ARP probing, falling back to the neighbor table.
    #[default]
    Auto,
    /// Active ARP probing only.
    Active,
    /// Neighbor table only, no packets sent.
    Passive,
}

/// External command locations.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolPaths {
    #[serde(default = "default_arp")]
    pub arp: String,
    #[serde(default = "default_nslookup")]
    pub nslookup: String,
    #[serde(default = "default_nmblookup")]
    pub nmblookup: String,
    #[serde(default = "default_ping")]
    pub ping: String,
}

impl ScanConfig {
    pub fn per_host_timeout(&self) -> Duration {
        Duration::from_secs(self.per_host_timeout_secs)
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    pub fn probe_wait(&self) -> Duration {
        Duration::from_millis(self.probe_wait_ms)
    }

    /// Check the configuration and parse the range. Runs before any network
    /// activity so a bad invocation fails fast.
    pub fn validate(&self) -> Result<AddressRange> {
        if self.pool_size == 0 {
            return Err(DiscoverError::Config(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.per_host_timeout_secs == 0 {
            return Err(DiscoverError::Config(
                "per_host_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.strategy_timeout_secs == 0 {
            return Err(DiscoverError::Config(
                "strategy_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.discovery != DiscoveryMode::Passive && self.probe_wait_ms == 0 {
            return Err(DiscoverError::Config(
                "probe_wait_ms must be greater than zero for active discovery".to_string(),
            ));
        }

        Ok(AddressRange::parse(&self.range)?)
    }
}

fn default_range() -> String {
    "192.168.31.0/24".to_string()
}

fn default_per_host_timeout() -> u64 {
    10
}

fn default_strategy_timeout() -> u64 {
    5
}

fn default_pool_size() -> usize {
    20
}

fn default_probe_wait() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_arp() -> String {
    "arp".to_string()
}

fn default_nslookup() -> String {
    "nslookup".to_string()
}

fn default_nmblookup() -> String {
    "nmblookup".to_string()
}

fn default_ping() -> String {
    "ping".to_string()
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            arp: default_arp(),
            nslookup: default_nslookup(),
            nmblookup: default_nmblookup(),
            ping: default_ping(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            per_host_timeout_secs: default_per_host_timeout(),
            strategy_timeout_secs: default_strategy_timeout(),
            pool_size: default_pool_size(),
            mode: ReportMode::default(),
            probe_wait_ms: default_probe_wait(),
            discovery: DiscoveryMode::default(),
            interface: None,
            tools: ToolPaths::default(),
            echo_probe: default_true(),
            oui_file: None,
        }
    }
}
