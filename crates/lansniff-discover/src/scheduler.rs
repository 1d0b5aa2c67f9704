//! Concurrent hostname resolution.
//!
//! Spawns one tokio task per discovered device. A semaphore caps how many run
//! the resolver chain at once, and each task is bounded by the per-host
//! timeout once it holds a permit.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use lansniff_core::{DiscoveredDevice, ResolutionOutcome};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::resolve::HostnameResolver;

/// Runs the hostname chain for many devices with bounded parallelism.
pub struct ResolutionScheduler {
    resolver: Arc<HostnameResolver>,
    pool_size: usize,
    per_host_timeout: Duration,
}

impl ResolutionScheduler {
    pub fn new(resolver: Arc<HostnameResolver>, pool_size: usize, per_host_timeout: Duration) -> Self {
        Self {
            resolver,
            pool_size: pool_size.max(1),
            per_host_timeout,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Resolve every device and return exactly one outcome per address.
    ///
    /// Completion order is arbitrary; results are keyed by address. A device
    /// whose task times out or panics gets an unresolved outcome.
    pub async fn resolve_all(
        &self,
        devices: &[DiscoveredDevice],
    ) -> HashMap<Ipv4Addr, ResolutionOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();

        for device in devices {
            let ip = device.address;
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            let limit = self.per_host_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (ip, ResolutionOutcome::unresolved());
                };

                match timeout(limit, resolver.resolve(ip)).await {
                    Ok(outcome) => (ip, outcome),
                    Err(_) => {
                        tracing::debug!(
                            ip = %ip,
                            timeout_secs = limit.as_secs(),
                            "Hostname resolution timed out"
                        );
                        (ip, ResolutionOutcome::unresolved())
                    }
                }
            });
        }

        let mut outcomes = HashMap::with_capacity(devices.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((ip, outcome)) => {
                    outcomes.entry(ip).or_insert(outcome);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Resolution task panicked");
                }
            }
        }

        for device in devices {
            outcomes
                .entry(device.address)
                .or_insert_with(ResolutionOutcome::unresolved);
        }

        tracing::debug!(
            devices = devices.len(),
            resolved = outcomes.values().filter(|o| o.hostname().is_some()).count(),
            "Resolution pass complete"
        );

        outcomes
    }
}
