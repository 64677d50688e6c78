// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session cookie jar
//!
//! One long-lived jar per client instance, shared by every request going
//! through it. Safe under concurrent read/update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Cookie {
    /// Create a new session cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie applies to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !url.path().starts_with(&self.path) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Parse a Set-Cookie header value
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let mut cookie = Cookie::new(name.trim(), value.trim());

        // Default domain to request host
        cookie.domain = url.host_str().unwrap_or("").to_string();

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                    "path" => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                        }
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Convert to Cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Thread-safe session cookie storage
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie, replacing a same-name/same-path predecessor
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        entry.push(cookie);
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// Get all cookies applying to a URL
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        let mut result = Vec::new();
        for entry in self.cookies.iter() {
            for cookie in entry.value().iter() {
                if cookie.matches(url) {
                    result.push(cookie.clone());
                }
            }
        }

        self.remove_expired();

        result
    }

    /// Render the Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://example.com/path").unwrap();
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_cookie_continuity() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/login").unwrap();

        jar.add_from_header("session=abc123; Path=/", &url);
        jar.add_from_header("theme=dark; Path=/", &url);

        let header = jar.get_cookie_header(&url).unwrap();
        assert!(header.contains("session=abc123"));
        assert!(header.contains("theme=dark"));
    }

    #[test]
    fn test_replacement_keeps_one_cookie() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();

        jar.add_from_header("session=old", &url);
        jar.add_from_header("session=new", &url);

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get_cookie_header(&url).unwrap(), "session=new");
    }

    #[test]
    fn test_secure_cookie_not_sent_over_http() {
        let jar = CookieJar::new();
        let https = Url::parse("https://example.com/").unwrap();
        let http = Url::parse("http://example.com/").unwrap();

        jar.add(Cookie::new("token", "s3cret").domain("example.com").secure(true));

        assert!(jar.get_cookie_header(&https).is_some());
        assert!(jar.get_cookie_header(&http).is_none());
    }

    #[test]
    fn test_expired_cookie_dropped() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();

        jar.add(
            Cookie::new("stale", "1")
                .domain("example.com")
                .expires(Utc::now() - chrono::Duration::hours(1)),
        );

        assert!(jar.get_cookie_header(&url).is_none());
    }
}
