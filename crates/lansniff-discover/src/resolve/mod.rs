//! Hostname resolution for a single address.
//!
//! [`HostnameResolver`] walks an ordered list of [`NameStrategy`]s and stops
//! at the first one that produces a usable name. Each strategy call is bounded
//! by its own timeout; failures, timeouts and missing tools just move the
//! chain on to the next strategy.

pub mod dns;
pub mod echo;
pub mod netbios;
pub mod nslookup;

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lansniff_core::{ResolutionOutcome, ResolutionStrategy};
use tokio::time::timeout;

use crate::config::ScanConfig;
use crate::error::Result;

pub use dns::ReverseDns;
pub use echo::EchoProbe;
pub use netbios::NetBiosQuery;
pub use nslookup::NameServiceQuery;

/// One way of turning an address into a hostname.
#[async_trait]
pub trait NameStrategy: Send + Sync {
    /// Label recorded in the outcome when this strategy wins.
    fn kind(&self) -> ResolutionStrategy;

    fn name(&self) -> &'static str;

    /// `Ok(None)` means the strategy ran and found nothing.
    async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>>;
}

/// Ordered, short-circuiting chain of hostname strategies.
pub struct HostnameResolver {
    strategies: Vec<Arc<dyn NameStrategy>>,
    strategy_timeout: Duration,
}

impl HostnameResolver {
    pub fn new(strategies: Vec<Arc<dyn NameStrategy>>, strategy_timeout: Duration) -> Self {
        Self {
            strategies,
            strategy_timeout,
        }
    }

    /// The standard chain: reverse DNS, `nslookup`, `nmblookup`, then the echo
    /// probe if enabled.
    pub fn from_config(config: &ScanConfig) -> Self {
        let limit = config.strategy_timeout();
        let mut strategies: Vec<Arc<dyn NameStrategy>> = vec![
            Arc::new(ReverseDns),
            Arc::new(NameServiceQuery::new(&config.tools.nslookup, limit)),
            Arc::new(NetBiosQuery::new(&config.tools.nmblookup, limit)),
        ];
        if config.echo_probe {
            strategies.push(Arc::new(EchoProbe::new(&config.tools.ping, limit)));
        }

        Self::new(strategies, limit)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, ip: Ipv4Addr) -> ResolutionOutcome {
        for strategy in &self.strategies {
            match timeout(self.strategy_timeout, strategy.lookup(ip)).await {
                Ok(Ok(Some(candidate))) => match accept_name(&candidate, ip) {
                    Some(hostname) => {
                        tracing::debug!(
                            ip = %ip,
                            strategy = strategy.name(),
                            hostname = %hostname,
                            "Hostname resolved"
                        );
                        return ResolutionOutcome::resolved(hostname, strategy.kind());
                    }
                    None => {
                        tracing::trace!(ip = %ip, strategy = strategy.name(), "Trivial answer ignored");
                    }
                },
                Ok(Ok(None)) => {}
                Ok(Err(e)) if e.is_unavailable() => {
                    tracing::debug!(ip = %ip, strategy = strategy.name(), error = %e, "Strategy skipped");
                }
                Ok(Err(e)) => {
                    tracing::debug!(ip = %ip, strategy = strategy.name(), error = %e, "Strategy failed");
                }
                Err(_) => {
                    tracing::debug!(
                        ip = %ip,
                        strategy = strategy.name(),
                        timeout_ms = self.strategy_timeout.as_millis() as u64,
                        "Strategy timed out"
                    );
                }
            }
        }

        ResolutionOutcome::unresolved()
    }
}

/// A name counts only if it is non-empty and not just the queried address.
fn accept_name(candidate: &str, ip: Ipv4Addr) -> Option<String> {
    let name = candidate.trim();
    if name.is_empty() || name == ip.to_string() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoverError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted strategy for exercising the chain.
    struct Scripted {
        kind: ResolutionStrategy,
        answer: fn(Ipv4Addr) -> Result<Option<String>>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(kind: ResolutionStrategy, answer: fn(Ipv4Addr) -> Result<Option<String>>) -> Self {
            Self {
                kind,
                answer,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl NameStrategy for Scripted {
        fn kind(&self) -> ResolutionStrategy {
            self.kind
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn lookup(&self, ip: Ipv4Addr) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            (self.answer)(ip)
        }
    }

    fn ip() -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 31, 8)
    }

    #[tokio::test]
    async fn first_success_wins_and_short_circuits() {
        let later = Scripted::new(ResolutionStrategy::NetBios, |_| Ok(Some("LATER".into())));
        let later_calls = later.calls.clone();
        let resolver = HostnameResolver::new(
            vec![
                Arc::new(Scripted::new(ResolutionStrategy::Dns, |_| Ok(None))),
                Arc::new(Scripted::new(ResolutionStrategy::NameService, |_| {
                    Ok(Some("nas.lan".into()))
                })),
                Arc::new(later),
            ],
            Duration::from_secs(1),
        );

        let outcome = resolver.resolve(ip()).await;
        assert_eq!(outcome.hostname(), Some("nas.lan"));
        assert_eq!(outcome.strategy(), ResolutionStrategy::NameService);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn answer_equal_to_ip_is_not_a_success() {
        let resolver = HostnameResolver::new(
            vec![
                Arc::new(Scripted::new(ResolutionStrategy::Dns, |ip| {
                    Ok(Some(ip.to_string()))
                })),
                Arc::new(Scripted::new(ResolutionStrategy::NetBios, |_| {
                    Ok(Some("  DESKTOP-01 ".into()))
                })),
            ],
            Duration::from_secs(1),
        );

        let outcome = resolver.resolve(ip()).await;
        assert_eq!(outcome.hostname(), Some("DESKTOP-01"));
        assert_eq!(outcome.strategy(), ResolutionStrategy::NetBios);
    }

    #[tokio::test]
    async fn errors_and_missing_tools_fall_through() {
        let resolver = HostnameResolver::new(
            vec![
                Arc::new(Scripted::new(ResolutionStrategy::Dns, |_| {
                    Err(DiscoverError::ParseMismatch {
                        source_name: "test".into(),
                        detail: "garbled".into(),
                    })
                })),
                Arc::new(Scripted::new(ResolutionStrategy::NetBios, |_| {
                    Err(DiscoverError::CommandNotFound {
                        command: "nmblookup".into(),
                    })
                })),
            ],
            Duration::from_secs(1),
        );

        let outcome = resolver.resolve(ip()).await;
        assert_eq!(outcome, ResolutionOutcome::unresolved());
    }

    #[tokio::test]
    async fn slow_strategy_is_cut_off_and_chain_continues() {
        let mut slow = Scripted::new(ResolutionStrategy::Dns, |_| Ok(Some("too-late".into())));
        slow.delay = Duration::from_secs(30);
        let resolver = HostnameResolver::new(
            vec![
                Arc::new(slow),
                Arc::new(Scripted::new(ResolutionStrategy::NameService, |_| {
                    Ok(Some("fast.lan".into()))
                })),
            ],
            Duration::from_millis(50),
        );

        let started = std::time::Instant::now();
        let outcome = resolver.resolve(ip()).await;
        assert_eq!(outcome.hostname(), Some("fast.lan"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn default_chain_order() {
        let resolver = HostnameResolver::from_config(&ScanConfig::default());
        assert_eq!(
            resolver.strategy_names(),
            vec!["reverse-dns", "nslookup", "nmblookup", "echo"]
        );

        let config = ScanConfig {
            echo_probe: false,
            ..Default::default()
        };
        assert_eq!(HostnameResolver::from_config(&config).strategy_names().len(), 3);
    }
}
