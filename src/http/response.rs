// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Normalized HTTP response types

use reqwest::header::HeaderMap;

/// Decoded response payload
///
/// The body is decoded as JSON when it parses; anything else is kept as
/// text. The fallback itself never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Body parsed as JSON
    Json(serde_json::Value),
    /// Body kept as text
    Text(String),
}

impl ResponseData {
    /// Decode a body: JSON when possible, lossy text otherwise
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(value) => ResponseData::Json(value),
            Err(_) => ResponseData::Text(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// The JSON value, when the body parsed as JSON
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            ResponseData::Text(_) => None,
        }
    }

    /// The text body, when the body did not parse as JSON
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }
}

/// Result of one executed request
#[derive(Debug, Clone)]
pub struct ClientResponse {
    /// Decoded payload
    pub data: ResponseData,
    /// Response status code
    pub status: u16,
    /// Response headers, passed through untouched
    pub headers: HeaderMap,
}

impl ClientResponse {
    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if status is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
