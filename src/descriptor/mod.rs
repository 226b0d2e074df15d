//! Descriptor parsing.
//!
//! Turns one raw descriptor string into a [`CanonicalRecord`]. Dispatch is by scheme
//! prefix; every parser keeps the input verbatim in `raw_uri`. Parsing never panics
//! and never logs above debug: callers count failures and move on.

mod encoding;
mod shadowsocks;
mod trojan;
mod types;
mod vless;
mod vmess;

use std::collections::HashMap;

use serde_json::Value;
use url::{Host, Url};

use crate::error_handling::DescriptorError;

pub use encoding::decode_base64;
pub use types::{
    CanonicalRecord, Endpoint, Protocol, ShadowsocksEndpoint, TrojanEndpoint, VlessEndpoint,
    VmessEndpoint,
};

/// Parses one descriptor (`vmess://`, `vless://`, `trojan://` or `ss://`).
///
/// # Errors
///
/// Returns a [`DescriptorError`] describing why the descriptor was rejected.
pub fn parse_descriptor(descriptor: &str) -> Result<CanonicalRecord, DescriptorError> {
    let descriptor = descriptor.trim();
    match Protocol::from_descriptor(descriptor) {
        Some(Protocol::Vmess) => vmess::parse_vmess(descriptor),
        Some(Protocol::Vless) => vless::parse_vless(descriptor),
        Some(Protocol::Trojan) => trojan::parse_trojan(descriptor),
        Some(Protocol::Shadowsocks) => shadowsocks::parse_shadowsocks(descriptor),
        None => Err(DescriptorError::UnsupportedScheme),
    }
}

/// The `credential@host:port?query#fragment` shape shared by vless and trojan.
struct AuthorityUri {
    user: String,
    host: String,
    port: u16,
    params: HashMap<String, String>,
    fragment: String,
}

impl AuthorityUri {
    fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let url = Url::parse(descriptor)?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => return Err(DescriptorError::MissingField("add")),
        };
        let port = match url.port() {
            None => return Err(DescriptorError::MissingPort),
            Some(0) => return Err(DescriptorError::InvalidPort("0".to_string())),
            Some(port) => port,
        };

        // First non-empty occurrence wins; empty values count as absent
        let mut params = HashMap::new();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        Ok(AuthorityUri {
            user: url.username().to_string(),
            host,
            port,
            params,
            fragment: url.fragment().unwrap_or_default().to_string(),
        })
    }

    fn credential(&self, field: &'static str) -> Result<String, DescriptorError> {
        if self.user.is_empty() {
            Err(DescriptorError::MissingField(field))
        } else {
            Ok(self.user.clone())
        }
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    fn param_or(&self, key: &str, default: &str) -> String {
        self.param(key).unwrap_or(default).to_string()
    }
}

/// Coerces a JSON port (number or numeric string) to `u16`.
fn coerce_port(value: &Value) -> Result<u16, DescriptorError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    parsed
        .filter(|port| *port != 0)
        .ok_or_else(|| DescriptorError::InvalidPort(value_to_string(value)))
}

/// Coerces a JSON number or numeric string to `u32`.
fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders a scalar JSON value as text; `null` and containers become empty.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
