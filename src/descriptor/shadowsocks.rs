//! `ss://` descriptors.
//!
//! Two encodings are in circulation:
//! 1. `ss://base64(method:password@host:port)#label`
//! 2. `ss://base64(method:password)@host:port#label` (SIP002)
//!
//! The whole-payload form is tried first; it only counts if the decoded text
//! contains `@`. Otherwise the credentials alone are decoded.

use super::encoding::decode_base64;
use super::types::{CanonicalRecord, Endpoint, ShadowsocksEndpoint};
use crate::error_handling::DescriptorError;

pub(super) fn parse_shadowsocks(descriptor: &str) -> Result<CanonicalRecord, DescriptorError> {
    let body = descriptor
        .strip_prefix("ss://")
        .ok_or(DescriptorError::UnsupportedScheme)?;
    let (main, label) = body.split_once('#').unwrap_or((body, ""));

    let (credentials, server) = match decode_base64(main).filter(|decoded| decoded.contains('@')) {
        Some(decoded) => {
            let (credentials, server) = decoded
                .split_once('@')
                .ok_or(DescriptorError::MalformedCredentials)?;
            (credentials.to_string(), server.trim().to_string())
        }
        None => {
            let (encoded, server) = main
                .split_once('@')
                .ok_or(DescriptorError::MalformedCredentials)?;
            let credentials =
                decode_base64(encoded).ok_or(DescriptorError::InvalidBase64)?;
            (credentials, strip_plugin_suffix(server).to_string())
        }
    };

    let (method, password) = credentials
        .trim()
        .split_once(':')
        .ok_or(DescriptorError::MalformedCredentials)?;
    if method.is_empty() {
        return Err(DescriptorError::MissingField("method"));
    }

    let (host, port) = server
        .rsplit_once(':')
        .ok_or(DescriptorError::MissingPort)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(DescriptorError::MissingField("add"));
    }
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| DescriptorError::InvalidPort(port.to_string()))?;

    Ok(CanonicalRecord {
        endpoint: Endpoint::Shadowsocks(ShadowsocksEndpoint {
            address: host.to_string(),
            port,
            method: method.to_string(),
            password: password.to_string(),
        }),
        display_label: label.to_string(),
        raw_uri: descriptor.to_string(),
    })
}

/// Drops a SIP002 `/?plugin=...` tail from the plaintext `host:port` part.
fn strip_plugin_suffix(server: &str) -> &str {
    let server = server.split('?').next().unwrap_or(server);
    server.trim_end_matches('/')
}
