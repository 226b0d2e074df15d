//! `vmess://<base64 JSON>` descriptors.

use serde_json::{Map, Value};

use super::encoding::decode_base64;
use super::types::{CanonicalRecord, Endpoint, VmessEndpoint};
use super::{coerce_port, coerce_u32, value_to_string};
use crate::error_handling::DescriptorError;

pub(super) fn parse_vmess(descriptor: &str) -> Result<CanonicalRecord, DescriptorError> {
    let payload = descriptor
        .strip_prefix("vmess://")
        .ok_or(DescriptorError::UnsupportedScheme)?;
    let json = decode_base64(payload).ok_or(DescriptorError::InvalidBase64)?;
    let data: Map<String, Value> = serde_json::from_str(json.trim())?;

    let address = field(&data, "add");
    if address.is_empty() {
        return Err(DescriptorError::MissingField("add"));
    }
    let port = match data.get("port") {
        None | Some(Value::Null) => return Err(DescriptorError::MissingPort),
        Some(value) => coerce_port(value)?,
    };
    let id = field(&data, "id");
    if id.is_empty() {
        return Err(DescriptorError::MissingField("id"));
    }

    let endpoint = VmessEndpoint {
        address,
        port,
        id,
        alter_id: data.get("aid").and_then(coerce_u32).unwrap_or(0),
        network: field_or(&data, "net", "tcp"),
        header_type: field_or(&data, "type", "none"),
        host: field(&data, "host"),
        path: field(&data, "path"),
        tls: field(&data, "tls"),
        sni: field(&data, "sni"),
    };

    Ok(CanonicalRecord {
        endpoint: Endpoint::Vmess(endpoint),
        display_label: field(&data, "ps"),
        raw_uri: descriptor.to_string(),
    })
}

fn field(data: &Map<String, Value>, key: &str) -> String {
    data.get(key).map(value_to_string).unwrap_or_default()
}

fn field_or(data: &Map<String, Value>, key: &str, default: &str) -> String {
    let value = field(data, key);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn encode(json: &str) -> String {
        format!("vmess://{}", STANDARD.encode(json))
    }

    #[test]
    fn test_parse_vmess_with_string_port() {
        let uri = encode(
            r#"{"v":"2","ps":"de-01","add":"vm.example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"cdn.example.com","path":"/ray","tls":"tls"}"#,
        );
        let record = parse_vmess(&uri).unwrap();
        let Endpoint::Vmess(e) = &record.endpoint else {
            panic!("expected vmess endpoint");
        };
        assert_eq!(e.address, "vm.example.com");
        assert_eq!(e.port, 443);
        assert_eq!(e.network, "ws");
        assert_eq!(e.path, "/ray");
        assert_eq!(e.tls, "tls");
        assert_eq!(record.display_label, "de-01");
        assert_eq!(record.raw_uri, uri);
    }

    #[test]
    fn test_parse_vmess_defaults() {
        let uri = encode(r#"{"add":"1.2.3.4","port":8080,"id":"abc"}"#);
        let record = parse_vmess(&uri).unwrap();
        let Endpoint::Vmess(e) = record.endpoint else {
            panic!("expected vmess endpoint");
        };
        assert_eq!(e.alter_id, 0);
        assert_eq!(e.network, "tcp");
        assert_eq!(e.header_type, "none");
        assert_eq!(e.tls, "");
    }

    #[test]
    fn test_parse_vmess_unpadded_payload() {
        let full = STANDARD.encode(r#"{"add":"h","port":1,"id":"x"}"#);
        let uri = format!("vmess://{}", full.trim_end_matches('='));
        assert!(parse_vmess(&uri).is_ok());
    }

    #[test]
    fn test_parse_vmess_rejects_bad_port() {
        let uri = encode(r#"{"add":"1.2.3.4","port":"https","id":"abc"}"#);
        assert!(matches!(
            parse_vmess(&uri),
            Err(DescriptorError::InvalidPort(_))
        ));

        let uri = encode(r#"{"add":"1.2.3.4","id":"abc"}"#);
        assert!(matches!(parse_vmess(&uri), Err(DescriptorError::MissingPort)));
    }

    #[test]
    fn test_parse_vmess_rejects_garbage() {
        assert!(matches!(
            parse_vmess("vmess://%%%"),
            Err(DescriptorError::InvalidBase64)
        ));
        let not_json = format!("vmess://{}", STANDARD.encode("hello"));
        assert!(matches!(
            parse_vmess(&not_json),
            Err(DescriptorError::InvalidJson(_))
        ));
    }
}
