// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Proxy bypass list matching
//!
//! Decides whether a destination is exempt from proxying. The destination
//! host is resolved through live DNS under a hard 200ms budget; an
//! inconclusive check fails open to proxying, never to a direct connect.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use ipnet::IpNet;
use url::Url;

use crate::error::{Error, Result};

/// Hard budget for the bypass DNS lookup
pub const DNS_TIMEOUT: Duration = Duration::from_millis(200);

/// One parsed bypass-list pattern
///
/// Entries are order-significant: the list is evaluated left to right and
/// the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BypassEntry {
    /// Single address, e.g. `10.1.2.3`
    Address(IpAddr),
    /// CIDR block, e.g. `10.0.0.0/8`
    Network(IpNet),
    /// Inclusive range, e.g. `10.0.0.1-10.0.0.99`
    Range(IpAddr, IpAddr),
}

impl BypassEntry {
    /// Check whether the entry covers the given address
    pub fn matches(&self, addr: IpAddr) -> bool {
        match self {
            BypassEntry::Address(a) => addr == *a,
            BypassEntry::Network(net) => net.contains(&addr),
            // Ranges only apply within one address family
            BypassEntry::Range(start, end) => {
                addr.is_ipv4() == start.is_ipv4() && *start <= addr && addr <= *end
            }
        }
    }
}

impl FromStr for BypassEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(net) = s.parse::<IpNet>() {
            return Ok(BypassEntry::Network(net));
        }
        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(BypassEntry::Address(addr));
        }
        if let Some((start, end)) = s.split_once('-') {
            let start: IpAddr = start
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid bypass range start: {}", s)))?;
            let end: IpAddr = end
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid bypass range end: {}", s)))?;
            if start.is_ipv4() != end.is_ipv4() || end < start {
                return Err(Error::config(format!("Invalid bypass range: {}", s)));
            }
            return Ok(BypassEntry::Range(start, end));
        }
        Err(Error::config(format!("Invalid bypass entry: {}", s)))
    }
}

/// Parse a raw semicolon-delimited bypass list
///
/// Unparseable entries are skipped with a warning; order is preserved.
pub fn parse_bypass_list(raw: &str) -> Vec<BypassEntry> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<BypassEntry>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(entry, error = %err, "Skipping bypass entry");
                None
            }
        })
        .collect()
}

/// Outcome of the raced DNS lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOutcome {
    /// Lookup finished within budget
    Resolved(IpAddr),
    /// Budget elapsed first; the late result is discarded
    TimedOut,
    /// Lookup finished with an error
    Failed,
}

/// Resolve a hostname to a single address
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to one IP address
    async fn resolve(&self, host: &str) -> Result<IpAddr>;
}

/// DNS resolver backed by hickory, using the system configuration
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    /// Create a resolver from the system DNS configuration
    pub fn from_system() -> Result<Self> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| Error::config(format!("Failed to read system DNS config: {}", e)))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        let lookup = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| Error::network(host, e.to_string()))?;
        lookup
            .iter()
            .next()
            .ok_or_else(|| Error::network(host, "no address records"))
    }
}

/// Matches destinations against the operator bypass list
#[derive(Clone)]
pub struct BypassMatcher {
    resolver: Arc<dyn HostResolver>,
    dns_timeout: Duration,
}

impl BypassMatcher {
    /// Create a matcher with the default 200ms DNS budget
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            resolver,
            dns_timeout: DNS_TIMEOUT,
        }
    }

    /// Override the DNS budget
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Decide whether the destination is exempt from proxying
    ///
    /// Returns `false` for an empty list, an unresolvable host, or a DNS
    /// lookup that overruns its budget. Never fails.
    pub async fn is_bypassed(&self, url: &Url, bypass_list_raw: &str) -> bool {
        if bypass_list_raw.trim().is_empty() {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };

        let outcome = self.resolve_destination(host).await;
        let ip = match outcome {
            DnsOutcome::Resolved(ip) => ip,
            DnsOutcome::TimedOut => {
                tracing::info!(host, "DNS lookup for bypass check timed out, not bypassing");
                return false;
            }
            DnsOutcome::Failed => {
                tracing::info!(host, "Could not resolve ip address for the bypass list");
                return false;
            }
        };

        for entry in parse_bypass_list(bypass_list_raw) {
            if entry.matches(ip) {
                tracing::info!(host, %ip, ?entry, "Destination is on the proxy bypass list");
                return true;
            }
        }
        false
    }

    /// First settled of {resolution, failure, timer} decides the outcome.
    /// A literal IP host needs no lookup.
    async fn resolve_destination(&self, host: &str) -> DnsOutcome {
        // RFC 3986 wraps raw IPv6 hosts in brackets
        let bare = host.trim_matches(|c| c == '[' || c == ']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return DnsOutcome::Resolved(ip);
        }

        match tokio::time::timeout(self.dns_timeout, self.resolver.resolve(host)).await {
            Ok(Ok(ip)) => DnsOutcome::Resolved(ip),
            Ok(Err(err)) => {
                tracing::debug!(host, error = %err, "DNS lookup failed");
                DnsOutcome::Failed
            }
            Err(_) => DnsOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Resolver over a fixed host table
    struct StaticResolver {
        hosts: HashMap<String, IpAddr>,
    }

    impl StaticResolver {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                hosts: entries
                    .iter()
                    .map(|(host, ip)| (host.to_string(), ip.parse().unwrap()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl HostResolver for StaticResolver {
        async fn resolve(&self, host: &str) -> Result<IpAddr> {
            self.hosts
                .get(host)
                .copied()
                .ok_or_else(|| Error::network(host, "no such host"))
        }
    }

    /// Resolver that never answers within any budget
    struct HangingResolver;

    #[async_trait]
    impl HostResolver for HangingResolver {
        async fn resolve(&self, _host: &str) -> Result<IpAddr> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn matcher(entries: &[(&str, &str)]) -> BypassMatcher {
        BypassMatcher::new(Arc::new(StaticResolver::new(entries)))
    }

    #[test]
    fn test_entry_parsing() {
        assert_eq!(
            "10.1.2.3".parse::<BypassEntry>().unwrap(),
            BypassEntry::Address("10.1.2.3".parse().unwrap())
        );
        assert_eq!(
            "10.0.0.0/8".parse::<BypassEntry>().unwrap(),
            BypassEntry::Network("10.0.0.0/8".parse().unwrap())
        );
        assert_eq!(
            "10.0.0.1-10.0.0.99".parse::<BypassEntry>().unwrap(),
            BypassEntry::Range("10.0.0.1".parse().unwrap(), "10.0.0.99".parse().unwrap())
        );

        assert!("proxy.local".parse::<BypassEntry>().is_err());
        assert!("10.0.0.99-10.0.0.1".parse::<BypassEntry>().is_err());
    }

    #[test]
    fn test_unparseable_entries_are_skipped() {
        let entries = parse_bypass_list("garbage;10.0.0.0/8; ;127.0.0.1");
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], BypassEntry::Network(_)));
        assert!(matches!(entries[1], BypassEntry::Address(_)));
    }

    #[test]
    fn test_entry_matching() {
        let net: BypassEntry = "10.0.0.0/8".parse().unwrap();
        assert!(net.matches("10.255.0.1".parse().unwrap()));
        assert!(!net.matches("11.0.0.1".parse().unwrap()));

        let range: BypassEntry = "192.168.1.10-192.168.1.20".parse().unwrap();
        assert!(range.matches("192.168.1.15".parse().unwrap()));
        assert!(!range.matches("192.168.1.21".parse().unwrap()));
        assert!(!range.matches("::1".parse().unwrap()));
    }

    #[test]
    fn test_empty_list_never_bypasses() {
        let m = matcher(&[("internal.corp", "10.1.2.3")]);
        let url = Url::parse("https://internal.corp/api").unwrap();

        tokio_test::block_on(async {
            assert!(!m.is_bypassed(&url, "").await);
            assert!(!m.is_bypassed(&url, "   ").await);
        });
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let m = matcher(&[("internal.corp", "10.1.2.3")]);
        let url = Url::parse("https://internal.corp/api").unwrap();

        assert!(m.is_bypassed(&url, "10.0.0.0/8").await);
        assert!(m.is_bypassed(&url, "192.168.0.0/16;10.1.2.3").await);
        assert!(!m.is_bypassed(&url, "192.168.0.0/16;172.16.0.0/12").await);
    }

    #[tokio::test]
    async fn test_dns_failure_fails_open_to_proxy() {
        let m = matcher(&[]);
        let url = Url::parse("https://unknown.corp/api").unwrap();

        assert!(!m.is_bypassed(&url, "0.0.0.0/0").await);
    }

    #[tokio::test]
    async fn test_dns_timeout_fails_open_to_proxy() {
        let m = BypassMatcher::new(Arc::new(HangingResolver))
            .with_dns_timeout(Duration::from_millis(20));
        let url = Url::parse("https://slow.corp/api").unwrap();

        assert!(!m.is_bypassed(&url, "0.0.0.0/0").await);
    }

    #[tokio::test]
    async fn test_literal_ip_host_skips_dns() {
        // HangingResolver would stall any lookup; a literal IP must not reach it
        let m = BypassMatcher::new(Arc::new(HangingResolver))
            .with_dns_timeout(Duration::from_millis(20));

        let url = Url::parse("https://10.1.2.3/api").unwrap();
        assert!(m.is_bypassed(&url, "10.0.0.0/8").await);

        let url6 = Url::parse("https://[::1]/api").unwrap();
        assert!(m.is_bypassed(&url6, "::1").await);
    }
}
