// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-request proxy agent resolution
//!
//! Decides for each outbound request whether traffic goes through a proxy
//! and with which transport: plain or TLS, optional CA trust anchors,
//! optional client certificate, optional basic-auth credentials embedded
//! in the proxy URL. Expected problems (missing config, unreadable
//! certificate) degrade to safe defaults; only a malformed proxy URL
//! fails the request.

use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::config::{ConfigSource, ProxyAuthType, ProxySettings};
use crate::error::{Error, Result};
use crate::proxy::bypass::BypassMatcher;
use crate::proxy::system::OsProxyQuery;

/// CA trust anchors for the identity-provider chain
///
/// One PEM blob per anchor; may be empty.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchors {
    pems: Vec<Vec<u8>>,
}

impl TrustAnchors {
    /// No extra trust anchors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a list of PEM blobs
    pub fn from_pems(pems: Vec<Vec<u8>>) -> Self {
        Self { pems }
    }

    /// Add one anchor
    pub fn add(&mut self, pem: impl Into<Vec<u8>>) {
        self.pems.push(pem.into());
    }

    /// Whether any anchors are present
    pub fn is_empty(&self) -> bool {
        self.pems.is_empty()
    }

    /// The anchor PEMs
    pub fn pems(&self) -> &[Vec<u8>] {
        &self.pems
    }
}

/// Transport description for one proxied request
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Effective proxy URL, credentials embedded when basic auth applies
    pub proxy_url: Url,
    /// Extra CA anchor PEMs, may be empty
    pub ca_chain: Vec<Vec<u8>>,
    /// Client certificate PEM (cert + key)
    pub client_cert: Option<String>,
    /// Whether a client certificate was actually supplied
    pub request_peer_cert: bool,
}

/// Result of proxy resolution for one destination
///
/// The variant follows the destination scheme, not the proxy's.
#[derive(Debug, Clone)]
pub enum ResolvedProxy {
    /// Direct connection
    None,
    /// Proxy for a plain-HTTP destination
    Http(AgentConfig),
    /// Proxy for an HTTPS destination
    Https(AgentConfig),
}

impl ResolvedProxy {
    /// Whether this is a direct connection
    pub fn is_none(&self) -> bool {
        matches!(self, ResolvedProxy::None)
    }

    /// The agent config, when proxying applies
    pub fn agent(&self) -> Option<&AgentConfig> {
        match self {
            ResolvedProxy::None => None,
            ResolvedProxy::Http(agent) | ResolvedProxy::Https(agent) => Some(agent),
        }
    }
}

/// Resolves the proxy agent for each outbound request
///
/// Settings are re-read per call; nothing is cached across destinations.
#[derive(Clone)]
pub struct ProxyAgentResolver {
    config: Arc<dyn ConfigSource>,
    os_proxy: Arc<dyn OsProxyQuery>,
    matcher: BypassMatcher,
    trust_anchors: TrustAnchors,
}

impl ProxyAgentResolver {
    /// Create a resolver without extra trust anchors
    pub fn new(
        config: Arc<dyn ConfigSource>,
        os_proxy: Arc<dyn OsProxyQuery>,
        matcher: BypassMatcher,
    ) -> Self {
        Self {
            config,
            os_proxy,
            matcher,
            trust_anchors: TrustAnchors::empty(),
        }
    }

    /// Attach identity-provider trust anchors
    pub fn with_trust_anchors(mut self, anchors: TrustAnchors) -> Self {
        self.trust_anchors = anchors;
        self
    }

    /// Resolve the proxy agent for a destination
    pub async fn resolve(&self, url: &Url) -> Result<ResolvedProxy> {
        let settings = ProxySettings::from_source(self.config.as_ref());

        // Default behavior is always the OS setting, also when nothing is set
        let proxy_url = if settings.use_os() {
            let picked = self.os_proxy.proxy_for_url(url).await;
            tracing::debug!(proxy = ?picked, "Proxy url picked from os settings");
            picked
        } else {
            let picked = settings.configured_proxy();
            tracing::debug!(proxy = ?picked, "Proxy url picked from config");
            picked
        };

        let bypassed = self
            .matcher
            .is_bypassed(url, settings.bypass_list.as_deref().unwrap_or(""))
            .await;
        tracing::debug!(url = %url, bypassed, "Bypass verdict");

        let Some(proxy_url) = proxy_url.filter(|p| !p.trim().is_empty()) else {
            return Ok(ResolvedProxy::None);
        };
        if bypassed {
            return Ok(ResolvedProxy::None);
        }

        let mut proxy = parse_proxy_url(&proxy_url)?;

        // Embed credentials as userinfo when basic auth is fully configured
        if settings.auth_type == ProxyAuthType::Basic {
            if let (Some(username), Some(password)) =
                (&settings.basic_username, &settings.basic_password)
            {
                tracing::info!("Proxy uses basic auth");
                proxy
                    .set_username(username)
                    .and_then(|_| proxy.set_password(Some(password.as_str())))
                    .map_err(|_| {
                        Error::malformed_proxy(proxy_url.clone(), "cannot carry credentials")
                    })?;
            }
        }

        let client_cert = if settings.auth_type == ProxyAuthType::ClientCert {
            read_client_certificate(settings.client_cert_path.as_deref())
        } else {
            None
        };

        let ca_chain = self.trust_anchors.pems().to_vec();

        if url.scheme() == "https" {
            tracing::debug!(proxy = %proxy, "Building https proxy agent");
            Ok(ResolvedProxy::Https(AgentConfig {
                proxy_url: proxy,
                ca_chain,
                request_peer_cert: client_cert.is_some(),
                client_cert,
            }))
        } else {
            // Plain destinations carry trust anchors only
            tracing::debug!(proxy = %proxy, "Building http proxy agent");
            Ok(ResolvedProxy::Http(AgentConfig {
                proxy_url: proxy,
                ca_chain,
                client_cert: None,
                request_peer_cert: false,
            }))
        }
    }
}

/// Parse a proxy URL string. A scheme-less `host:port` (the config
/// format) is treated as plain HTTP.
fn parse_proxy_url(raw: &str) -> Result<Url> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let url =
        Url::parse(&candidate).map_err(|e| Error::malformed_proxy(raw, e.to_string()))?;
    if url.host_str().is_none() {
        return Err(Error::malformed_proxy(raw, "missing host"));
    }
    Ok(url)
}

/// Read the client certificate file. Any failure downgrades to "no
/// certificate" so the request itself is never blocked.
fn read_client_certificate(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(pem) => Some(pem),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Client certificate unreadable, continuing without it"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proxy_url_accepts_host_port() {
        let url = parse_proxy_url("proxy.local:8080").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("proxy.local"));
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_parse_proxy_url_keeps_scheme() {
        let url = parse_proxy_url("https://proxy.local:3128").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.port(), Some(3128));
    }

    #[test]
    fn test_parse_proxy_url_rejects_garbage() {
        assert!(parse_proxy_url("http://").is_err());
    }

    #[test]
    fn test_missing_cert_file_downgrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.pem");
        assert_eq!(read_client_certificate(Some(&path)), None);
        assert_eq!(read_client_certificate(None), None);
    }

    #[test]
    fn test_readable_cert_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.pem");
        std::fs::write(&path, "-----BEGIN CERTIFICATE-----\n").unwrap();

        let pem = read_client_certificate(Some(&path)).unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    }
}
