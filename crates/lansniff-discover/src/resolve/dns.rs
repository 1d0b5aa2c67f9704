//! Reverse DNS through the system resolver.

use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use lansniff_core::ResolutionStrategy;

use super::NameStrategy;
use crate::error::{DiscoverError, Result};

/// PTR lookup via `getnameinfo`. The call blocks, so it runs on the blocking
/// pool; when the resolver times out the thread is left to finish on its own.
pub struct ReverseDns;

#[async_trait]
impl NameStrategy for ReverseDns {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::Dns
    }

    fn name(&self) -> &'static str {
        "reverse-dns"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>> {
        let addr = IpAddr::V4(ip);
        let answer = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&addr))
            .await
            .map_err(|e| {
                DiscoverError::CapabilityUnavailable(format!("reverse DNS task failed: {e}"))
            })?;

        match answer {
            Ok(hostname) => Ok(Some(hostname)),
            Err(e) => {
                tracing::trace!(ip = %ip, error = %e, "Reverse DNS found nothing");
                Ok(None)
            }
        }
    }
}
