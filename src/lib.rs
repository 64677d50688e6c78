// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Mustekala - Proxy-Aware Outbound HTTP Client
//!
//! Decides per request whether to route through a system/corporate proxy
//! or connect directly, and executes the request with cookie continuity.
//!
//! ## Features
//!
//! - Per-request proxy resolution: OS-provided or configured, never cached
//! - Bypass lists: IP / CIDR / IP-range patterns against live DNS with a
//!   hard 200ms budget; inconclusive checks fail open to proxying
//! - Basic auth embedded in the proxy URL; client-certificate proxy auth
//!   with soft fallback on unreadable files
//! - Custom CA trust anchors for TLS-terminating proxies
//! - Shared session cookie jar, safe under concurrent requests
//! - Redirects off by default, overridable per call
//! - Failures flattened into a primitive-only, serialization-safe shape
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mustekala::{
//!     BypassMatcher, EnvOsProxy, HttpClient, MemoryConfigSource,
//!     ProxyAgentResolver, SystemResolver, keys,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(MemoryConfigSource::new());
//!     config.set(keys::PROXY_IGNORE_LIST, "10.0.0.0/8");
//!
//!     let matcher = BypassMatcher::new(Arc::new(SystemResolver::from_system()?));
//!     let resolver = ProxyAgentResolver::new(config, Arc::new(EnvOsProxy), matcher);
//!     let client = HttpClient::new(resolver);
//!
//!     let response = client.get("https://example.com/api/status").await?;
//!     println!("{}: {:?}", response.status, response.data);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod proxy;

// Re-exports for convenience

// Configuration
pub use config::{keys, ConfigSource, ConfigValue, MemoryConfigSource, ProxyAuthType, ProxySettings};

// Errors
pub use error::{Error, NormalizedError, NormalizedResponse, Result};

// HTTP
pub use http::{
    ClientResponse, Cookie, CookieJar, Envelope, HttpClient, HttpMethod, RequestOptions,
    ResponseData,
};

// Proxy resolution
pub use proxy::{
    parse_bypass_list, AgentConfig, BypassEntry, BypassMatcher, DnsOutcome, EnvOsProxy,
    HostResolver, NoOsProxy, OsProxyQuery, ProxyAgentResolver, ResolvedProxy, SystemResolver,
    TrustAnchors, DNS_TIMEOUT,
};

/// Mustekala version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
