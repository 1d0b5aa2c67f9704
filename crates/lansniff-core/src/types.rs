//! Core domain types for a single scan run.
//!
//! A scan moves each host through two records: a [`DiscoveredDevice`] produced
//! by address discovery, and a [`ResolvedDevice`] produced once hostname and
//! vendor enrichment has finished. The second one is read-only.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::error::{CoreError, Result};

/// Placeholder rendered whenever a hostname or vendor could not be determined.
pub const UNKNOWN: &str = "Unknown";

// ── Hardware address ──────────────────────────────────────────────

/// A 48-bit link-layer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The vendor prefix in `"00:1C:B3"` form.
    pub fn oui(&self) -> String {
        format!("{:02X}:{:02X}:{:02X}", self.0[0], self.0[1], self.0[2])
    }

    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; 6]
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    /// Accepts `:` or `-` separators and one- or two-digit octets, since BSD
    /// `arp -a` drops leading zeros (`0:1c:b3:a:b:c`).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidHardwareAddress(s.to_string());
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

// ── Address range ─────────────────────────────────────────────────

/// A validated IPv4 subnet to scan.
///
/// Accepts CIDR notation (`192.168.1.0/24`) or a single address, which is
/// treated as a `/32`. Host bits are cleared, so `192.168.1.77/24` scans the
/// same range as `192.168.1.0/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange(Ipv4Net);

impl AddressRange {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |reason: String| CoreError::InvalidRange {
            input: input.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("range is empty".to_string()));
        }

        let net = if trimmed.contains('/') {
            trimmed
                .parse::<Ipv4Net>()
                .map_err(|e| invalid(e.to_string()))?
        } else {
            let addr = trimmed
                .parse::<Ipv4Addr>()
                .map_err(|e| invalid(e.to_string()))?;
            Ipv4Net::new(addr, 32).map_err(|e| invalid(e.to_string()))?
        };

        Ok(Self(net.trunc()))
    }

    pub fn network(&self) -> Ipv4Net {
        self.0
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.0.contains(&ip)
    }

    /// Total number of addresses covered, network and broadcast included.
    pub fn address_count(&self) -> u64 {
        1u64 << (32 - u32::from(self.0.prefix_len()))
    }

    /// Addresses worth probing: every usable host address in the range.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        self.0.hosts()
    }
}

impl FromStr for AddressRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Devices ───────────────────────────────────────────────────────

/// A host that answered address resolution, before any enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: Ipv4Addr,
    pub hardware_address: MacAddress,
}

impl DiscoveredDevice {
    pub fn new(address: Ipv4Addr, hardware_address: MacAddress) -> Self {
        Self {
            address,
            hardware_address,
        }
    }
}

/// Which hostname strategy produced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    Dns,
    NameService,
    NetBios,
    None,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::NameService => "name-service",
            Self::NetBios => "netbios",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the hostname chain for one address. Frozen once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    hostname: Option<String>,
    strategy: ResolutionStrategy,
}

impl ResolutionOutcome {
    pub fn resolved(hostname: impl Into<String>, strategy: ResolutionStrategy) -> Self {
        Self {
            hostname: Some(hostname.into()),
            strategy,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            hostname: None,
            strategy: ResolutionStrategy::None,
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }
}

impl Default for ResolutionOutcome {
    fn default() -> Self {
        Self::unresolved()
    }
}

/// A fully enriched host as it appears in the final report.
///
/// `hostname` and `vendor` are always populated: a missing value becomes
/// [`UNKNOWN`]. There are no mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    address: Ipv4Addr,
    hardware_address: MacAddress,
    hostname: String,
    vendor: String,
    strategy: ResolutionStrategy,
}

impl ResolvedDevice {
    pub fn new(device: DiscoveredDevice, outcome: ResolutionOutcome, vendor: &str) -> Self {
        let hostname = outcome
            .hostname
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let vendor = match vendor.trim() {
            "" => UNKNOWN.to_string(),
            v => v.to_string(),
        };

        Self {
            address: device.address,
            hardware_address: device.hardware_address,
            hostname,
            vendor,
            strategy: outcome.strategy,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn hardware_address(&self) -> MacAddress {
        self.hardware_address
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }
}
