//! Address discovery sources.
//!
//! A scan uses exactly one [`AddressSource`], picked by [`build_source`] when
//! the scanner is constructed. In `auto` mode that source is a
//! [`FallbackSource`] that tries active ARP probing first and reads the OS
//! neighbor table when probing is unavailable.

pub mod arp;
pub mod neighbor;

use std::collections::HashSet;

use async_trait::async_trait;
use lansniff_core::{AddressRange, DiscoveredDevice};

use crate::config::{DiscoveryMode, ScanConfig};
use crate::error::Result;

pub use arp::ArpProber;
pub use neighbor::NeighborTable;

/// Devices found by one discovery run, tagged with the source that found them.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub source: &'static str,
    pub devices: Vec<DiscoveredDevice>,
}

impl Discovery {
    pub fn new(source: &'static str, devices: Vec<DiscoveredDevice>) -> Self {
        Self {
            source,
            devices: dedupe_by_address(devices),
        }
    }
}

/// Something that can list live (address, hardware address) pairs in a range.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Discover devices in `range`. Order of the result is undefined.
    async fn discover(&self, range: &AddressRange) -> Result<Discovery>;
}

/// Runs `primary`, and `fallback` if the primary fails for any reason.
pub struct FallbackSource {
    primary: Box<dyn AddressSource>,
    fallback: Box<dyn AddressSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn AddressSource>, fallback: Box<dyn AddressSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl AddressSource for FallbackSource {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn discover(&self, range: &AddressRange) -> Result<Discovery> {
        match self.primary.discover(range).await {
            Ok(discovery) => Ok(discovery),
            Err(e) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary discovery unavailable, falling back"
                );
                self.fallback.discover(range).await
            }
        }
    }
}

/// Build the discovery source for this configuration.
pub fn build_source(config: &ScanConfig) -> Box<dyn AddressSource> {
    let prober = || -> Box<dyn AddressSource> {
        Box::new(ArpProber::new(config.interface.clone(), config.probe_wait()))
    };
    let table = || -> Box<dyn AddressSource> {
        Box::new(NeighborTable::new(
            &config.tools.arp,
            vec!["-a".to_string()],
            config.strategy_timeout(),
        ))
    };

    match config.discovery {
        DiscoveryMode::Auto => Box::new(FallbackSource::new(prober(), table())),
        DiscoveryMode::Active => prober(),
        DiscoveryMode::Passive => table(),
    }
}

/// Keep the first record seen for each address.
pub fn dedupe_by_address(devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
    let mut seen = HashSet::with_capacity(devices.len());
    devices
        .into_iter()
        .filter(|d| seen.insert(d.address))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoverError;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl AddressSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn discover(&self, _range: &AddressRange) -> Result<Discovery> {
            Err(DiscoverError::CapabilityUnavailable("no raw sockets".to_string()))
        }
    }

    struct Fixed {
        calls: Arc<AtomicUsize>,
        devices: Vec<DiscoveredDevice>,
    }

    #[async_trait]
    impl AddressSource for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn discover(&self, _range: &AddressRange) -> Result<Discovery> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Discovery::new(self.name(), self.devices.clone()))
        }
    }

    fn device(last: u8, mac: &str) -> DiscoveredDevice {
        DiscoveredDevice::new(Ipv4Addr::new(10, 0, 0, last), mac.parse().unwrap())
    }

    #[tokio::test]
    async fn fallback_runs_when_primary_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FallbackSource::new(
            Box::new(Failing),
            Box::new(Fixed {
                calls: calls.clone(),
                devices: vec![device(1, "aa:bb:cc:00:00:01")],
            }),
        );

        let range = AddressRange::parse("10.0.0.0/24").unwrap();
        let discovery = source.discover(&range).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(discovery.source, "fixed");
        assert_eq!(discovery.devices.len(), 1);
    }

    #[tokio::test]
    async fn fallback_skipped_when_primary_succeeds_with_no_devices() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FallbackSource::new(
            Box::new(Fixed {
                calls: Arc::new(AtomicUsize::new(0)),
                devices: vec![],
            }),
            Box::new(Fixed {
                calls: calls.clone(),
                devices: vec![device(1, "aa:bb:cc:00:00:01")],
            }),
        );

        let range = AddressRange::parse("10.0.0.0/24").unwrap();
        let discovery = source.discover(&range).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(discovery.devices.is_empty());
    }

    #[test]
    fn dedupe_keeps_first_record_per_address() {
        let devices = vec![
            device(2, "aa:bb:cc:00:00:02"),
            device(1, "aa:bb:cc:00:00:01"),
            device(2, "aa:bb:cc:00:00:99"),
        ];
        let deduped = dedupe_by_address(devices);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].hardware_address.to_string(), "aa:bb:cc:00:00:02");
    }

    #[test]
    fn build_source_names() {
        let mut config = ScanConfig::default();
        assert_eq!(build_source(&config).name(), "arp");

        config.discovery = DiscoveryMode::Passive;
        assert_eq!(build_source(&config).name(), "neighbor-table");

        config.discovery = DiscoveryMode::Active;
        assert_eq!(build_source(&config).name(), "arp");
    }
}
