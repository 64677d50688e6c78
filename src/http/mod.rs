// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP execution layer
//!
//! A proxy-aware client with session cookie continuity, normalized
//! responses, and boundary-safe error flattening.

mod client;
mod cookie;
mod request;
mod response;

pub use client::HttpClient;
pub use cookie::{Cookie, CookieJar};
pub use request::{Envelope, HttpMethod, RequestOptions};
pub use response::{ClientResponse, ResponseData};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("mustekala/", env!("CARGO_PKG_VERSION"));

/// Default forced Origin header value
pub const DEFAULT_ORIGIN: &str = "*";
