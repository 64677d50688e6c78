// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! OS proxy settings lookup
//!
//! The resolver asks the operating system which proxy applies to a
//! destination. Embedders with a native facility (WinHTTP, SCF, a
//! browser session) implement [`OsProxyQuery`]; the shipped
//! implementation reads the conventional proxy environment variables.

use std::env;

use async_trait::async_trait;
use url::Url;

/// Ask the OS for the proxy that applies to a URL
#[async_trait]
pub trait OsProxyQuery: Send + Sync {
    /// Proxy URL string mandated for this destination, or `None`
    async fn proxy_for_url(&self, url: &Url) -> Option<String>;
}

/// OS proxy lookup via environment variables
///
/// Checks `HTTPS_PROXY`/`HTTP_PROXY` by destination scheme, then
/// `ALL_PROXY`, each in upper and lower case.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvOsProxy;

impl EnvOsProxy {
    fn var(name: &str) -> Option<String> {
        env::var(name)
            .or_else(|_| env::var(name.to_lowercase()))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Pick the variable set for a destination scheme
    pub(crate) fn lookup(scheme: &str, var: impl Fn(&str) -> Option<String>) -> Option<String> {
        let scheme_var = if scheme == "https" {
            "HTTPS_PROXY"
        } else {
            "HTTP_PROXY"
        };
        var(scheme_var).or_else(|| var("ALL_PROXY"))
    }
}

#[async_trait]
impl OsProxyQuery for EnvOsProxy {
    async fn proxy_for_url(&self, url: &Url) -> Option<String> {
        Self::lookup(url.scheme(), Self::var)
    }
}

/// OS proxy lookup that never reports a proxy
///
/// For embedders that route OS handling elsewhere or want config-only
/// behavior regardless of the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOsProxy;

#[async_trait]
impl OsProxyQuery for NoOsProxy {
    async fn proxy_for_url(&self, _url: &Url) -> Option<String> {
        None
    }
}
