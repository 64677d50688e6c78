// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Mustekala
//!
//! Failures that reach a caller are convertible into [`NormalizedError`],
//! a primitive-only shape that survives serialization across process and
//! trust boundaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Mustekala operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Mustekala
#[derive(Error, Debug)]
pub enum Error {
    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Proxy URL obtained from config or the OS is unusable
    #[error("Malformed proxy URL '{url}': {reason}")]
    MalformedProxy { url: String, reason: String },

    /// Transport-level failure, no response was received
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Upstream answered with an error status
    #[error("Upstream HTTP {status} for {url}")]
    UpstreamHttp {
        url: String,
        status: u16,
        body: String,
        headers: BTreeMap<String, String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-proxy error
    pub fn malformed_proxy(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedProxy {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is a transport failure without a response
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    /// Check if this carries an upstream HTTP response
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::UpstreamHttp { .. })
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::Network { url, .. } => Some(url),
            Error::UpstreamHttp { url, .. } => Some(url),
            Error::MalformedProxy { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Flatten into the boundary-safe shape
    pub fn normalized(&self) -> NormalizedError {
        NormalizedError::from(self)
    }
}

/// Primitive-only error representation, safe to pass across a process
/// or trust boundary. No live handles, no stack-carrying instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedError {
    /// Human-readable failure message
    pub message: String,
    /// Upstream response context, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<NormalizedResponse>,
}

/// Response context carried by a [`NormalizedError`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<&Error> for NormalizedError {
    fn from(err: &Error) -> Self {
        match err {
            Error::UpstreamHttp {
                url,
                status,
                body,
                headers,
            } => NormalizedError {
                message: err.to_string(),
                response: Some(NormalizedResponse {
                    url: Some(url.clone()),
                    body: Some(body.clone()),
                    headers: Some(headers.clone()),
                    status_code: Some(*status),
                }),
            },
            Error::Network { url, .. } => NormalizedError {
                message: err.to_string(),
                response: Some(NormalizedResponse {
                    url: Some(url.clone()),
                    ..Default::default()
                }),
            },
            other => NormalizedError {
                message: other.to_string(),
                response: None,
            },
        }
    }
}

impl std::fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NormalizedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_normalization() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        let err = Error::UpstreamHttp {
            url: "https://example.com/api".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
            headers,
        };

        let normalized = err.normalized();
        let response = normalized.response.expect("response context");
        assert_eq!(response.status_code, Some(502));
        assert_eq!(response.body.as_deref(), Some("bad gateway"));
        assert_eq!(response.url.as_deref(), Some("https://example.com/api"));
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = Error::network("https://example.com", "connection refused");

        assert!(err.is_network());
        assert_eq!(err.status_code(), None);

        let normalized = err.normalized();
        assert!(!normalized.message.is_empty());
        assert_eq!(normalized.response.unwrap().status_code, None);
    }

    #[test]
    fn test_normalized_error_is_pure_data() {
        let err = Error::UpstreamHttp {
            url: "https://example.com".to_string(),
            status: 404,
            body: "not found".to_string(),
            headers: BTreeMap::new(),
        };

        let json = serde_json::to_string(&err.normalized()).unwrap();
        let back: NormalizedError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err.normalized());
    }
}
