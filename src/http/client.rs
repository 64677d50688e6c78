// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Proxy-aware HTTP client
//!
//! Executes GET/POST against a destination with a transport resolved per
//! request, one shared session cookie jar, and redirects off by default.
//! Success is normalized into [`ClientResponse`]; failure into the crate
//! error type, flattenable to a primitive-only shape.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, SET_COOKIE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, Identity};
use url::Url;

use super::cookie::CookieJar;
use super::request::{Envelope, HttpMethod, RequestOptions};
use super::response::{ClientResponse, ResponseData};
use super::{DEFAULT_ORIGIN, DEFAULT_USER_AGENT};
use crate::error::{Error, Result};
use crate::proxy::{AgentConfig, ProxyAgentResolver, ResolvedProxy};

/// Maximum redirects when the caller opts into following them
const MAX_REDIRECTS: usize = 10;

/// Session-wide default headers, mutable between requests
#[derive(Debug, Clone)]
struct SessionDefaults {
    user_agent: String,
    origin: String,
}

/// Proxy-aware HTTP client with a session cookie jar
#[derive(Clone)]
pub struct HttpClient {
    resolver: ProxyAgentResolver,
    cookie_jar: CookieJar,
    defaults: Arc<RwLock<SessionDefaults>>,
}

impl HttpClient {
    /// Create a client. The cookie jar is created here and lives as long
    /// as the client.
    pub fn new(resolver: ProxyAgentResolver) -> Self {
        Self {
            resolver,
            cookie_jar: CookieJar::new(),
            defaults: Arc::new(RwLock::new(SessionDefaults {
                user_agent: DEFAULT_USER_AGENT.to_string(),
                origin: DEFAULT_ORIGIN.to_string(),
            })),
        }
    }

    /// Get the session cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Set the User-Agent sent on subsequent requests
    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        self.defaults.write().user_agent = user_agent.into();
    }

    /// Set the Origin sent on subsequent requests
    pub fn set_origin(&self, origin: impl Into<String>) {
        self.defaults.write().origin = origin.into();
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl AsRef<str>) -> Result<ClientResponse> {
        self.execute(HttpMethod::Get, url, RequestOptions::new(), None)
            .await
    }

    /// Execute a POST request with a JSON body
    pub async fn post_json(
        &self,
        url: impl AsRef<str>,
        value: serde_json::Value,
    ) -> Result<ClientResponse> {
        self.execute(
            HttpMethod::Post,
            url,
            RequestOptions::new(),
            Some(Envelope::Json(value)),
        )
        .await
    }

    /// Execute a POST request with a raw body
    pub async fn post_raw(
        &self,
        url: impl AsRef<str>,
        body: impl Into<Bytes>,
    ) -> Result<ClientResponse> {
        self.execute(
            HttpMethod::Post,
            url,
            RequestOptions::new(),
            Some(Envelope::raw(body)),
        )
        .await
    }

    /// Execute a request
    ///
    /// The proxy agent is resolved fresh for the destination; nothing is
    /// reused across calls except the cookie jar.
    pub async fn execute(
        &self,
        method: HttpMethod,
        url: impl AsRef<str>,
        options: RequestOptions,
        envelope: Option<Envelope>,
    ) -> Result<ClientResponse> {
        let url = Url::parse(url.as_ref())?;

        let proxy = self.resolver.resolve(&url).await.map_err(|err| {
            tracing::error!(url = %url, error = %err, "Proxy resolution failed");
            err
        })?;

        let client = self.build_transport(&proxy, &options)?;
        let mut builder = client.request(method.as_reqwest(), url.clone());

        // Forced defaults first; caller headers replace them, never duplicate
        let mut headers = HeaderMap::new();
        {
            let defaults = self.defaults.read();
            if let Ok(value) = HeaderValue::try_from(defaults.origin.as_str()) {
                headers.insert(ORIGIN, value);
            }
            if let Ok(value) = HeaderValue::try_from(defaults.user_agent.as_str()) {
                headers.insert(USER_AGENT, value);
            }
        }
        for (name, value) in options.headers.iter() {
            headers.insert(name, value.clone());
        }

        if let Some(cookie_header) = self.cookie_jar.get_cookie_header(&url) {
            if let Ok(value) = HeaderValue::try_from(cookie_header) {
                headers.insert(COOKIE, value);
            }
        }
        builder = builder.headers(headers);

        match envelope {
            Some(Envelope::Json(value)) => builder = builder.json(&value),
            Some(Envelope::Raw(body)) => builder = builder.body(body),
            None => {}
        }

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(%method, url = %url, "Sending request");
        let response = builder.send().await.map_err(|err| {
            let normalized = Error::network(url.as_str(), scrub_error(&err));
            tracing::error!(url = %url, error = %normalized, "HTTP request failed");
            normalized
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let final_url = response.url().clone();

        // Fold session cookies back into the jar
        for cookie in headers.get_all(SET_COOKIE) {
            if let Ok(cookie_str) = cookie.to_str() {
                self.cookie_jar.add_from_header(cookie_str, &final_url);
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| Error::network(final_url.as_str(), scrub_error(&err)))?;

        if status >= 400 {
            let err = Error::UpstreamHttp {
                url: final_url.to_string(),
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
                headers: flatten_headers(&headers),
            };
            tracing::error!(url = %final_url, status, "Upstream returned an error status");
            return Err(err);
        }

        tracing::debug!(url = %final_url, status, "Response received");
        Ok(ClientResponse {
            data: ResponseData::from_body(&body),
            status,
            headers,
        })
    }

    /// Build the transport for one request from the resolved agent
    fn build_transport(&self, proxy: &ResolvedProxy, options: &RequestOptions) -> Result<Client> {
        let follow = options.follow_redirect.unwrap_or(false);
        let mut builder = Client::builder()
            .redirect(if follow {
                Policy::limited(MAX_REDIRECTS)
            } else {
                Policy::none()
            })
            .cookie_store(false); // the jar is ours

        match proxy {
            ResolvedProxy::None => {
                // Direct connect; the environment must not re-introduce a proxy
                builder = builder.no_proxy();
            }
            ResolvedProxy::Http(agent) => {
                let upstream = reqwest::Proxy::http(agent.proxy_url.as_str())
                    .map_err(|e| Error::malformed_proxy(agent.proxy_url.as_str(), e.to_string()))?;
                builder = add_trust_anchors(builder.proxy(upstream), agent)?;
            }
            ResolvedProxy::Https(agent) => {
                let upstream = reqwest::Proxy::https(agent.proxy_url.as_str())
                    .map_err(|e| Error::malformed_proxy(agent.proxy_url.as_str(), e.to_string()))?;
                builder = add_trust_anchors(builder.proxy(upstream), agent)?;

                if agent.request_peer_cert {
                    if let Some(pem) = &agent.client_cert {
                        match Identity::from_pem(pem.as_bytes()) {
                            Ok(identity) => builder = builder.identity(identity),
                            Err(err) => {
                                tracing::warn!(
                                    error = %err,
                                    "Client certificate PEM rejected, continuing without it"
                                );
                            }
                        }
                    }
                }
            }
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build transport: {}", e)))
    }
}

/// Attach the agent's CA anchors as additional roots
fn add_trust_anchors(
    mut builder: reqwest::ClientBuilder,
    agent: &AgentConfig,
) -> Result<reqwest::ClientBuilder> {
    for pem in &agent.ca_chain {
        let cert = Certificate::from_pem(pem)
            .map_err(|e| Error::config(format!("Invalid trust anchor: {}", e)))?;
        builder = builder.add_root_certificate(cert);
    }
    Ok(builder)
}

/// Flatten response headers into primitive pairs
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            flat.entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }
    flat
}

/// Render a transport error without its source chain of live handles
fn scrub_error(err: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigSource;
    use crate::proxy::{BypassMatcher, HostResolver, NoOsProxy};
    use async_trait::async_trait;
    use std::net::IpAddr;

    struct NoResolver;

    #[async_trait]
    impl HostResolver for NoResolver {
        async fn resolve(&self, host: &str) -> Result<IpAddr> {
            Err(Error::network(host, "no such host"))
        }
    }

    fn client() -> HttpClient {
        let resolver = ProxyAgentResolver::new(
            Arc::new(MemoryConfigSource::new()),
            Arc::new(NoOsProxy),
            BypassMatcher::new(Arc::new(NoResolver)),
        );
        HttpClient::new(resolver)
    }

    #[test]
    fn test_session_defaults_mutable() {
        let client = client();
        client.set_user_agent("custom-agent/2.0");
        assert_eq!(client.defaults.read().user_agent, "custom-agent/2.0");
        assert_eq!(client.defaults.read().origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn test_direct_transport_builds() {
        let client = client();
        let transport =
            client.build_transport(&ResolvedProxy::None, &RequestOptions::new());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_proxied_transport_builds() {
        let client = client();
        let agent = AgentConfig {
            proxy_url: Url::parse("http://proxy.local:8080").unwrap(),
            ca_chain: Vec::new(),
            client_cert: None,
            request_peer_cert: false,
        };
        let transport = client
            .build_transport(&ResolvedProxy::Https(agent), &RequestOptions::new());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_flatten_headers_joins_duplicates() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().unwrap());
        headers.append("set-cookie", "b=2".parse().unwrap());

        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("set-cookie").unwrap(), "a=1, b=2");
    }
}
