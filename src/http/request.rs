// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request shapes: method, payload envelope, per-call options

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::Result;

/// HTTP methods supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Request payload: a structured object sent as JSON, or a raw body.
/// The two are mutually exclusive by construction.
#[derive(Debug, Clone)]
pub enum Envelope {
    /// Sent as a JSON body with `content-type: application/json`
    Json(serde_json::Value),
    /// Sent verbatim
    Raw(Bytes),
}

impl Envelope {
    /// JSON envelope from any serializable value
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Envelope::Json(serde_json::to_value(value)?))
    }

    /// Raw envelope
    pub fn raw(body: impl Into<Bytes>) -> Self {
        Envelope::Raw(body.into())
    }
}

impl From<serde_json::Value> for Envelope {
    fn from(value: serde_json::Value) -> Self {
        Envelope::Json(value)
    }
}

/// Per-request options
///
/// Every recognized field is explicit; there is no pass-through bag.
/// A caller-supplied `follow_redirect` wins over the default `false`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Follow redirects; unset means no
    pub follow_redirect: Option<bool>,
    /// Extra headers, overriding the client defaults
    pub headers: HeaderMap,
    /// Per-request timeout; unset means none
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set redirect following
    pub fn follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = Some(follow);
        self
    }

    /// Set a header. Invalid names/values are dropped.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_from_serializable() {
        #[derive(Serialize)]
        struct Challenge {
            code: String,
        }

        let envelope = Envelope::json(&Challenge {
            code: "abc".to_string(),
        })
        .unwrap();

        match envelope {
            Envelope::Json(value) => assert_eq!(value["code"], "abc"),
            Envelope::Raw(_) => panic!("expected JSON envelope"),
        }
    }

    #[test]
    fn test_options_header_override() {
        let options = RequestOptions::new()
            .header("user-agent", "custom/1.0")
            .header("bad\nname", "dropped");

        assert_eq!(options.headers.len(), 1);
        assert_eq!(
            options.headers.get("user-agent").unwrap().to_str().unwrap(),
            "custom/1.0"
        );
    }

    #[test]
    fn test_follow_redirect_default_unset() {
        assert_eq!(RequestOptions::new().follow_redirect, None);
        assert_eq!(
            RequestOptions::new().follow_redirect(true).follow_redirect,
            Some(true)
        );
    }
}
