// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Proxy decision layer
//!
//! Resolves, per outbound request, whether to go through a proxy and with
//! which transport. Reusable standalone, without the HTTP client on top.

mod bypass;
mod resolver;
mod system;

pub use bypass::{
    parse_bypass_list, BypassEntry, BypassMatcher, DnsOutcome, HostResolver, SystemResolver,
    DNS_TIMEOUT,
};
pub use resolver::{AgentConfig, ProxyAgentResolver, ResolvedProxy, TrustAnchors};
pub use system::{EnvOsProxy, NoOsProxy, OsProxyQuery};
