//! Scan pipeline.
//!
//! discovery → resolution fan-out → vendor lookup → sorted report. One
//! [`NetworkScanner`] runs one scan; nothing is kept between runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lansniff_core::{AddressRange, ResolutionOutcome, ResolutionStrategy, ResolvedDevice};
use uuid::Uuid;

use crate::config::{ReportMode, ScanConfig};
use crate::error::Result;
use crate::probe::{self, AddressSource, Discovery};
use crate::report;
use crate::resolve::HostnameResolver;
use crate::scheduler::ResolutionScheduler;
use crate::vendor::VendorTable;

/// Result of a single scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Unique ID for this scan run.
    pub scan_id: Uuid,
    pub range: AddressRange,
    /// Name of the discovery source that produced the device list.
    pub source: &'static str,
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
    /// Devices sorted by numeric address.
    pub devices: Vec<ResolvedDevice>,
}

impl ScanReport {
    pub fn render(&self, mode: ReportMode) -> String {
        report::render(&self.devices, mode)
    }
}

pub struct NetworkScanner {
    config: ScanConfig,
    source: Box<dyn AddressSource>,
    scheduler: ResolutionScheduler,
    vendors: VendorTable,
}

impl NetworkScanner {
    /// Validate `config` and wire up the standard components.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let vendors = match &config.oui_file {
            Some(path) => VendorTable::load_file(path)?,
            None => VendorTable::builtin().clone(),
        };
        let source = probe::build_source(&config);
        let resolver = HostnameResolver::from_config(&config);

        tracing::debug!(
            source = source.name(),
            strategies = ?resolver.strategy_names(),
            vendors = vendors.len(),
            "Scanner configured"
        );

        Ok(Self::with_components(config, source, resolver, vendors))
    }

    /// Assemble a scanner from explicit parts.
    pub fn with_components(
        config: ScanConfig,
        source: Box<dyn AddressSource>,
        resolver: HostnameResolver,
        vendors: VendorTable,
    ) -> Self {
        let scheduler = ResolutionScheduler::new(
            Arc::new(resolver),
            config.pool_size,
            config.per_host_timeout(),
        );
        Self {
            config,
            source,
            scheduler,
            vendors,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one scan.
    ///
    /// Fails only if the configuration is unusable. A discovery source that
    /// cannot run yields an empty report; hosts whose name or vendor cannot be
    /// determined are reported with placeholders.
    pub async fn scan(&self) -> Result<ScanReport> {
        let range = self.config.validate()?;
        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            scan_id = %scan_id,
            range = %range,
            source = self.source.name(),
            "Starting scan"
        );

        let discovery = match self.source.discover(&range).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    scan_id = %scan_id,
                    source = self.source.name(),
                    error = %e,
                    "Discovery failed, reporting no devices"
                );
                Discovery::new(self.source.name(), Vec::new())
            }
        };

        let found = probe::dedupe_by_address(discovery.devices);
        tracing::info!(
            scan_id = %scan_id,
            source = discovery.source,
            hosts = found.len(),
            discovery_ms = start.elapsed().as_millis() as u64,
            "Discovery complete"
        );

        let mut outcomes = self.scheduler.resolve_all(&found).await;
        let devices: Vec<ResolvedDevice> = found
            .into_iter()
            .map(|device| {
                let outcome = outcomes
                    .remove(&device.address)
                    .unwrap_or_else(ResolutionOutcome::unresolved);
                let vendor = self.vendors.lookup(&device.hardware_address);
                ResolvedDevice::new(device, outcome, vendor)
            })
            .collect();
        let devices = report::assemble(devices);

        let duration = start.elapsed();
        let named = devices
            .iter()
            .filter(|d| d.strategy() != ResolutionStrategy::None)
            .count();
        tracing::info!(
            scan_id = %scan_id,
            range = %range,
            hosts = devices.len(),
            named,
            duration_ms = duration.as_millis() as u64,
            "Scan complete"
        );

        Ok(ScanReport {
            scan_id,
            range,
            source: discovery.source,
            started_at,
            duration,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoverError;
    use async_trait::async_trait;
    use lansniff_core::{DiscoveredDevice, MacAddress, UNKNOWN};
    use std::net::Ipv4Addr;

    struct Static(Vec<DiscoveredDevice>);

    #[async_trait]
    impl AddressSource for Static {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn discover(&self, _range: &AddressRange) -> Result<Discovery> {
            Ok(Discovery::new("static", self.0.clone()))
        }
    }

    struct Broken;

    #[async_trait]
    impl AddressSource for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn discover(&self, _range: &AddressRange) -> Result<Discovery> {
            Err(DiscoverError::CapabilityUnavailable("no interface".to_string()))
        }
    }

    fn config() -> ScanConfig {
        ScanConfig {
            range: "10.0.0.0/24".to_string(),
            per_host_timeout_secs: 1,
            ..Default::default()
        }
    }

    fn scanner(source: Box<dyn AddressSource>) -> NetworkScanner {
        NetworkScanner::with_components(
            config(),
            source,
            HostnameResolver::new(Vec::new(), Duration::from_secs(1)),
            VendorTable::builtin().clone(),
        )
    }

    #[tokio::test]
    async fn enriches_and_sorts() {
        let source = Static(vec![
            DiscoveredDevice::new(
                Ipv4Addr::new(10, 0, 0, 20),
                MacAddress([0x00, 0x50, 0x56, 1, 2, 3]),
            ),
            DiscoveredDevice::new(
                Ipv4Addr::new(10, 0, 0, 3),
                MacAddress([0x02, 0, 0, 0, 0, 1]),
            ),
        ]);

        let report = scanner(Box::new(source)).scan().await.unwrap();
        assert_eq!(report.source, "static");
        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.devices[0].address(), Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(report.devices[0].vendor(), UNKNOWN);
        assert_eq!(report.devices[1].vendor(), "VMware");
        assert!(report.devices.iter().all(|d| d.hostname() == UNKNOWN));
    }

    #[tokio::test]
    async fn failed_discovery_is_an_empty_report() {
        let report = scanner(Box::new(Broken)).scan().await.unwrap();
        assert!(report.devices.is_empty());
        assert_eq!(report.render(ReportMode::Summary), report::NO_DEVICES);
    }

    #[tokio::test]
    async fn bad_range_fails_before_discovery() {
        let mut scanner = scanner(Box::new(Broken));
        scanner.config.range = "10.0.0.0/33".to_string();
        let err = scanner.scan().await.unwrap_err();
        assert!(matches!(err, DiscoverError::Core(_)));
    }

    #[test]
    fn from_config_rejects_zero_pool() {
        let config = ScanConfig {
            pool_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            NetworkScanner::from_config(config),
            Err(DiscoverError::Config(_))
        ));
    }
}
