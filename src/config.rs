// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Proxy configuration source and settings snapshot
//!
//! Settings are re-read from the [`ConfigSource`] on every request so
//! operator changes take effect without a restart. Absent keys fall back
//! to safe defaults and never abort a request.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;

/// Configuration keys understood by the proxy layer
pub mod keys {
    /// Route through the OS-configured proxy. Absent means `true`.
    pub const USE_OS_SETTINGS: &str = "proxy.useOsSettings";
    /// Proxy host, used when OS settings are disabled
    pub const PROXY_ADDRESS: &str = "proxy.address";
    /// Proxy port, used when OS settings are disabled
    pub const PROXY_PORT: &str = "proxy.port";
    /// Proxy authentication: `none`, `basic` or `clientCert`
    pub const AUTH_TYPE: &str = "proxy.authType";
    /// Basic-auth username
    pub const PROXY_USERNAME: &str = "proxy.username";
    /// Basic-auth password
    pub const PROXY_PASSWORD: &str = "proxy.password";
    /// Path of the client certificate PEM (cert + key)
    pub const PROXY_CERTIFICATE_PATH: &str = "proxy.certificatePath";
    /// Semicolon-delimited bypass patterns (IP, CIDR, IP range)
    pub const PROXY_IGNORE_LIST: &str = "proxy.ignoreList";
}

/// A typed configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl ConfigValue {
    /// Interpret as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            ConfigValue::Number(_) => None,
        }
    }

    /// Interpret as a port number
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            ConfigValue::Number(n) => u16::try_from(*n).ok(),
            ConfigValue::Text(s) => s.trim().parse().ok(),
            ConfigValue::Bool(_) => None,
        }
    }

    /// Interpret as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Number(n)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

/// Key/value lookup for proxy settings
///
/// Absence is explicit (`None`), never a sentinel string.
pub trait ConfigSource: Send + Sync {
    /// Look up a value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// In-memory configuration source
///
/// Mutable while shared, so operator changes are visible to in-flight
/// clients on their next request.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    values: Arc<DashMap<String, ConfigValue>>,
}

impl MemoryConfigSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    /// Remove all values
    pub fn clear(&self) {
        self.values.clear();
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).map(|v| v.clone())
    }
}

/// Proxy authentication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyAuthType {
    /// No proxy authentication
    #[default]
    None,
    /// Username/password embedded in the proxy URL
    Basic,
    /// Client certificate presented during the TLS handshake
    ClientCert,
}

impl ProxyAuthType {
    /// Parse from a config value. Unknown values fall back to `None`.
    fn from_config(value: Option<ConfigValue>) -> Self {
        match value.as_ref().and_then(|v| v.as_text()) {
            Some("basic") => ProxyAuthType::Basic,
            Some("clientCert") => ProxyAuthType::ClientCert,
            _ => ProxyAuthType::None,
        }
    }
}

/// Read-only snapshot of the proxy settings
///
/// Built fresh from the [`ConfigSource`] for every resolution call.
#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    /// Route through the OS proxy; absent means yes
    pub use_os_settings: Option<bool>,
    /// Configured proxy host
    pub proxy_host: Option<String>,
    /// Configured proxy port
    pub proxy_port: Option<u16>,
    /// Proxy authentication mode
    pub auth_type: ProxyAuthType,
    /// Basic-auth username
    pub basic_username: Option<String>,
    /// Basic-auth password
    pub basic_password: Option<String>,
    /// Client certificate path
    pub client_cert_path: Option<PathBuf>,
    /// Raw bypass list
    pub bypass_list: Option<String>,
}

impl ProxySettings {
    /// Snapshot the current settings
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self {
            use_os_settings: source.get(keys::USE_OS_SETTINGS).and_then(|v| v.as_bool()),
            proxy_host: source
                .get(keys::PROXY_ADDRESS)
                .and_then(|v| v.as_text().map(str::to_string)),
            proxy_port: source.get(keys::PROXY_PORT).and_then(|v| v.as_u16()),
            auth_type: ProxyAuthType::from_config(source.get(keys::AUTH_TYPE)),
            basic_username: source
                .get(keys::PROXY_USERNAME)
                .and_then(|v| v.as_text().map(str::to_string)),
            basic_password: source
                .get(keys::PROXY_PASSWORD)
                .and_then(|v| v.as_text().map(str::to_string)),
            client_cert_path: source
                .get(keys::PROXY_CERTIFICATE_PATH)
                .and_then(|v| v.as_text().map(PathBuf::from)),
            bypass_list: source
                .get(keys::PROXY_IGNORE_LIST)
                .and_then(|v| v.as_text().map(str::to_string)),
        }
    }

    /// Whether the OS proxy settings apply. Default behavior is the OS
    /// setting, also when nothing is set.
    pub fn use_os(&self) -> bool {
        self.use_os_settings.unwrap_or(true)
    }

    /// The `host:port` proxy string built from config, when both parts
    /// are present
    pub fn configured_proxy(&self) -> Option<String> {
        match (&self.proxy_host, self.proxy_port) {
            (Some(host), Some(port)) if !host.trim().is_empty() => {
                Some(format!("{}:{}", host.trim(), port))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_empty_source() {
        let source = MemoryConfigSource::new();
        let settings = ProxySettings::from_source(&source);

        assert!(settings.use_os(), "absent useOsSettings means true");
        assert_eq!(settings.auth_type, ProxyAuthType::None);
        assert_eq!(settings.configured_proxy(), None);
    }

    #[test]
    fn test_configured_proxy_needs_host_and_port() {
        let source = MemoryConfigSource::new();
        source.set(keys::PROXY_ADDRESS, "proxy.local");
        let settings = ProxySettings::from_source(&source);
        assert_eq!(settings.configured_proxy(), None);

        source.set(keys::PROXY_PORT, 8080i64);
        let settings = ProxySettings::from_source(&source);
        assert_eq!(settings.configured_proxy().as_deref(), Some("proxy.local:8080"));
    }

    #[test]
    fn test_auth_type_parsing() {
        let source = MemoryConfigSource::new();

        source.set(keys::AUTH_TYPE, "basic");
        assert_eq!(
            ProxySettings::from_source(&source).auth_type,
            ProxyAuthType::Basic
        );

        source.set(keys::AUTH_TYPE, "clientCert");
        assert_eq!(
            ProxySettings::from_source(&source).auth_type,
            ProxyAuthType::ClientCert
        );

        source.set(keys::AUTH_TYPE, "kerberos");
        assert_eq!(
            ProxySettings::from_source(&source).auth_type,
            ProxyAuthType::None
        );
    }

    #[test]
    fn test_port_accepts_text_and_number() {
        assert_eq!(ConfigValue::Number(8080).as_u16(), Some(8080));
        assert_eq!(ConfigValue::Text("8080".into()).as_u16(), Some(8080));
        assert_eq!(ConfigValue::Number(-1).as_u16(), None);
        assert_eq!(ConfigValue::Number(70000).as_u16(), None);
    }

    #[test]
    fn test_settings_reread_sees_changes() {
        let source = MemoryConfigSource::new();
        source.set(keys::USE_OS_SETTINGS, false);
        assert!(!ProxySettings::from_source(&source).use_os());

        source.remove(keys::USE_OS_SETTINGS);
        assert!(ProxySettings::from_source(&source).use_os());
    }
}
