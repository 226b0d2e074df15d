//! Canonical record types.
//!
//! A record is a tagged union over the four supported protocols. Each variant is a
//! fixed struct; fields a protocol does not have simply do not exist on its variant.
//! The JSON form keeps the short field names used by subscription tooling
//! (`add`, `id`, `net`, `ps`, ...) so documents stay interchangeable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::{coerce_port, coerce_u32};
use crate::config::FALLBACK_OUTBOUND_PORT;

/// Protocol family of a descriptor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Vmess,
    Vless,
    Trojan,
    Shadowsocks,
}

impl Protocol {
    /// URI scheme prefix identifying this protocol, including `://`.
    pub fn scheme_prefix(&self) -> &'static str {
        match self {
            Protocol::Vmess => "vmess://",
            Protocol::Vless => "vless://",
            Protocol::Trojan => "trojan://",
            Protocol::Shadowsocks => "ss://",
        }
    }

    /// Detects the protocol from a descriptor's scheme prefix.
    pub fn from_descriptor(descriptor: &str) -> Option<Protocol> {
        Protocol::iter().find(|p| descriptor.starts_with(p.scheme_prefix()))
    }
}

/// VMess server (decoded from the base64 JSON payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessEndpoint {
    #[serde(rename = "add")]
    pub address: String,
    #[serde(deserialize_with = "lenient_port", default = "fallback_port")]
    pub port: u16,
    pub id: String,
    #[serde(rename = "aid", deserialize_with = "lenient_u32", default)]
    pub alter_id: u32,
    #[serde(rename = "net", default = "default_network")]
    pub network: String,
    #[serde(rename = "type", default = "default_none")]
    pub header_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub tls: String,
    #[serde(default)]
    pub sni: String,
}

/// VLESS server (`vless://id@host:port?query#label`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlessEndpoint {
    #[serde(rename = "add")]
    pub address: String,
    #[serde(deserialize_with = "lenient_port", default = "fallback_port")]
    pub port: u16,
    pub id: String,
    #[serde(default = "default_none")]
    pub encryption: String,
    #[serde(rename = "type", default = "default_network")]
    pub network: String,
    #[serde(default = "default_none")]
    pub security: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub sni: String,
    #[serde(rename = "fp", default)]
    pub fingerprint: String,
    #[serde(rename = "pbk", default)]
    pub public_key: String,
    #[serde(rename = "sid", default)]
    pub short_id: String,
    #[serde(default)]
    pub flow: String,
    #[serde(rename = "serviceName", default)]
    pub service_name: String,
}

/// Trojan server (`trojan://password@host:port?query#label`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrojanEndpoint {
    #[serde(rename = "add")]
    pub address: String,
    #[serde(deserialize_with = "lenient_port", default = "fallback_port")]
    pub port: u16,
    pub password: String,
    #[serde(default)]
    pub sni: String,
    #[serde(rename = "type", default = "default_network")]
    pub network: String,
    #[serde(default = "default_trojan_security")]
    pub security: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub host: String,
}

/// Shadowsocks server (`ss://...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowsocksEndpoint {
    #[serde(rename = "add")]
    pub address: String,
    #[serde(deserialize_with = "lenient_port", default = "fallback_port")]
    pub port: u16,
    pub method: String,
    pub password: String,
}

/// Protocol-specific connection details.
///
/// Record documents written by other tools often carry numbers as strings
/// (`"port": "443"`, `"aid": "0"`). Those are accepted; a port that cannot be read
/// becomes `FALLBACK_OUTBOUND_PORT` and lets the probe fail on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum Endpoint {
    Vmess(VmessEndpoint),
    Vless(VlessEndpoint),
    Trojan(TrojanEndpoint),
    Shadowsocks(ShadowsocksEndpoint),
}

impl Endpoint {
    pub fn protocol(&self) -> Protocol {
        match self {
            Endpoint::Vmess(_) => Protocol::Vmess,
            Endpoint::Vless(_) => Protocol::Vless,
            Endpoint::Trojan(_) => Protocol::Trojan,
            Endpoint::Shadowsocks(_) => Protocol::Shadowsocks,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Endpoint::Vmess(e) => &e.address,
            Endpoint::Vless(e) => &e.address,
            Endpoint::Trojan(e) => &e.address,
            Endpoint::Shadowsocks(e) => &e.address,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Endpoint::Vmess(e) => e.port,
            Endpoint::Vless(e) => e.port,
            Endpoint::Trojan(e) => e.port,
            Endpoint::Shadowsocks(e) => e.port,
        }
    }

    /// Connection-identity fields, in a fixed per-protocol order.
    ///
    /// Only the fingerprint engine reads this. Cosmetic data never appears here.
    pub fn identity_fields(&self) -> Vec<String> {
        match self {
            Endpoint::Vmess(e) => vec![
                e.address.clone(),
                e.port.to_string(),
                e.id.clone(),
                e.network.clone(),
                e.path.clone(),
                e.tls.clone(),
            ],
            Endpoint::Vless(e) => vec![
                e.address.clone(),
                e.port.to_string(),
                e.id.clone(),
                e.encryption.clone(),
                e.network.clone(),
                e.security.clone(),
                e.path.clone(),
            ],
            Endpoint::Trojan(e) => vec![
                e.address.clone(),
                e.port.to_string(),
                e.password.clone(),
                e.sni.clone(),
            ],
            Endpoint::Shadowsocks(e) => vec![
                e.address.clone(),
                e.port.to_string(),
                e.method.clone(),
                e.password.clone(),
            ],
        }
    }
}

/// A parsed descriptor: connection details plus the cosmetic label and the
/// original string, kept verbatim for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    #[serde(rename = "ps", default)]
    pub display_label: String,
    pub raw_uri: String,
}

impl CanonicalRecord {
    pub fn protocol(&self) -> Protocol {
        self.endpoint.protocol()
    }

    pub fn address(&self) -> &str {
        self.endpoint.address()
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port()
    }
}

fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_port(&value).unwrap_or(FALLBACK_OUTBOUND_PORT))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_u32(&value).unwrap_or(0))
}

fn fallback_port() -> u16 {
    FALLBACK_OUTBOUND_PORT
}

pub(crate) fn default_network() -> String {
    "tcp".to_string()
}

pub(crate) fn default_none() -> String {
    "none".to_string()
}

pub(crate) fn default_trojan_security() -> String {
    "tls".to_string()
}
