//! Engine configuration documents.
//!
//! One HTTP-proxy inbound on the worker's local port and one outbound mirroring the
//! record. Optional sections are left out entirely rather than written as `null`.

use serde_json::{json, Map, Value};

use crate::config::FALLBACK_OUTBOUND_PORT;
use crate::descriptor::{
    CanonicalRecord, Endpoint, ShadowsocksEndpoint, TrojanEndpoint, VlessEndpoint, VmessEndpoint,
};

/// Builds the engine document for `record` with its inbound on `127.0.0.1:local_port`.
pub fn build_engine_config(record: &CanonicalRecord, local_port: u16) -> Value {
    let outbound = match &record.endpoint {
        Endpoint::Vmess(e) => vmess_outbound(e),
        Endpoint::Vless(e) => vless_outbound(e),
        Endpoint::Trojan(e) => trojan_outbound(e),
        Endpoint::Shadowsocks(e) => shadowsocks_outbound(e),
    };

    json!({
        "log": { "loglevel": "none" },
        "inbounds": [{
            "listen": "127.0.0.1",
            "port": local_port,
            "protocol": "http",
            "settings": { "timeout": 0 }
        }],
        "outbounds": [outbound]
    })
}

fn outbound_port(port: u16) -> u16 {
    if port == 0 {
        FALLBACK_OUTBOUND_PORT
    } else {
        port
    }
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Transport and security fields shared by the three stream-based protocols.
struct Stream<'a> {
    network: &'a str,
    security: &'a str,
    server_name: &'a str,
    host_header: &'a str,
    path: &'a str,
    service_name: &'a str,
    fingerprint: &'a str,
    public_key: &'a str,
    short_id: &'a str,
}

impl Stream<'_> {
    fn settings(&self) -> Value {
        let security = match self.security {
            "" => "none",
            other => other,
        };
        let network = match self.network {
            "" => "tcp",
            other => other,
        };

        let mut stream = Map::new();
        stream.insert("network".into(), json!(network));
        stream.insert("security".into(), json!(security));

        match security {
            "tls" => {
                let mut tls = Map::new();
                tls.insert("serverName".into(), json!(self.server_name));
                tls.insert("allowInsecure".into(), json!(true));
                if !self.fingerprint.is_empty() {
                    tls.insert("fingerprint".into(), json!(self.fingerprint));
                }
                stream.insert("tlsSettings".into(), Value::Object(tls));
            }
            "reality" => {
                let mut reality = Map::new();
                reality.insert("serverName".into(), json!(self.server_name));
                if !self.public_key.is_empty() {
                    reality.insert("publicKey".into(), json!(self.public_key));
                }
                if !self.short_id.is_empty() {
                    reality.insert("shortId".into(), json!(self.short_id));
                }
                if !self.fingerprint.is_empty() {
                    reality.insert("fingerprint".into(), json!(self.fingerprint));
                }
                stream.insert("realitySettings".into(), Value::Object(reality));
            }
            _ => {}
        }

        match network {
            "ws" => {
                stream.insert(
                    "wsSettings".into(),
                    json!({ "path": self.path, "headers": { "Host": self.host_header } }),
                );
            }
            "grpc" => {
                let service_name = first_non_empty(&[self.service_name, self.path]);
                stream.insert(
                    "grpcSettings".into(),
                    json!({ "serviceName": service_name }),
                );
            }
            "http" | "h2" => {
                stream.insert(
                    "httpSettings".into(),
                    json!({ "path": self.path, "host": [self.host_header] }),
                );
            }
            _ => {}
        }

        Value::Object(stream)
    }
}

fn vmess_outbound(e: &VmessEndpoint) -> Value {
    let host_header = first_non_empty(&[&e.host, &e.address]);
    let stream = Stream {
        network: &e.network,
        security: &e.tls,
        server_name: first_non_empty(&[&e.sni, &e.host, &e.address]),
        host_header,
        path: &e.path,
        service_name: "",
        fingerprint: "",
        public_key: "",
        short_id: "",
    };
    json!({
        "protocol": "vmess",
        "settings": {
            "vnext": [{
                "address": e.address,
                "port": outbound_port(e.port),
                "users": [{ "id": e.id, "alterId": e.alter_id, "security": "auto" }]
            }]
        },
        "streamSettings": stream.settings()
    })
}

fn vless_outbound(e: &VlessEndpoint) -> Value {
    let mut user = Map::new();
    user.insert("id".into(), json!(e.id));
    user.insert("encryption".into(), json!(first_non_empty(&[&e.encryption, "none"])));
    if !e.flow.is_empty() {
        user.insert("flow".into(), json!(e.flow));
    }

    let stream = Stream {
        network: &e.network,
        security: &e.security,
        server_name: first_non_empty(&[&e.sni, &e.host, &e.address]),
        host_header: first_non_empty(&[&e.host, &e.address]),
        path: &e.path,
        service_name: &e.service_name,
        fingerprint: &e.fingerprint,
        public_key: &e.public_key,
        short_id: &e.short_id,
    };
    json!({
        "protocol": "vless",
        "settings": {
            "vnext": [{
                "address": e.address,
                "port": outbound_port(e.port),
                "users": [Value::Object(user)]
            }]
        },
        "streamSettings": stream.settings()
    })
}

fn trojan_outbound(e: &TrojanEndpoint) -> Value {
    let stream = Stream {
        network: &e.network,
        security: &e.security,
        server_name: first_non_empty(&[&e.sni, &e.host, &e.address]),
        host_header: first_non_empty(&[&e.host, &e.address]),
        path: &e.path,
        service_name: "",
        fingerprint: "",
        public_key: "",
        short_id: "",
    };
    json!({
        "protocol": "trojan",
        "settings": {
            "servers": [{
                "address": e.address,
                "port": outbound_port(e.port),
                "password": e.password
            }]
        },
        "streamSettings": stream.settings()
    })
}

fn shadowsocks_outbound(e: &ShadowsocksEndpoint) -> Value {
    json!({
        "protocol": "shadowsocks",
        "settings": {
            "servers": [{
                "address": e.address,
                "port": outbound_port(e.port),
                "method": e.method,
                "password": e.password
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_descriptor;

    fn outbound(uri: &str) -> Value {
        let record = parse_descriptor(uri).unwrap();
        build_engine_config(&record, 10_007)["outbounds"][0].clone()
    }

    #[test]
    fn test_inbound_is_local_http_proxy() {
        let record = parse_descriptor("trojan://p@1.2.3.4:443").unwrap();
        let config = build_engine_config(&record, 10_007);
        let inbound = &config["inbounds"][0];
        assert_eq!(inbound["port"], 10_007);
        assert_eq!(inbound["protocol"], "http");
        assert_eq!(inbound["listen"], "127.0.0.1");
        assert_eq!(config["outbounds"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_reality_settings_carry_keys() {
        let out = outbound("vless://u@1.2.3.4:443?security=reality&pbk=ABC&sid=12&sni=www.example.com&fp=chrome&flow=xtls-rprx-vision");
        let stream = &out["streamSettings"];
        assert_eq!(stream["security"], "reality");
        assert_eq!(stream["realitySettings"]["publicKey"], "ABC");
        assert_eq!(stream["realitySettings"]["shortId"], "12");
        assert_eq!(stream["realitySettings"]["serverName"], "www.example.com");
        assert!(stream.get("tlsSettings").is_none());
        assert_eq!(out["settings"]["vnext"][0]["users"][0]["flow"], "xtls-rprx-vision");
    }

    #[test]
    fn test_reality_without_short_id_omits_it() {
        let out = outbound("vless://u@1.2.3.4:443?security=reality&pbk=ABC");
        let reality = out["streamSettings"]["realitySettings"].as_object().unwrap();
        assert!(!reality.contains_key("shortId"));
    }

    #[test]
    fn test_websocket_transport() {
        let out = outbound("vless://u@1.2.3.4:443?type=ws&path=%2Fws&host=cdn.example.com&security=tls");
        let stream = &out["streamSettings"];
        assert_eq!(stream["network"], "ws");
        assert_eq!(stream["wsSettings"]["path"], "/ws");
        assert_eq!(stream["wsSettings"]["headers"]["Host"], "cdn.example.com");
        assert_eq!(stream["tlsSettings"]["serverName"], "cdn.example.com");
        assert!(stream.get("grpcSettings").is_none());
    }

    #[test]
    fn test_grpc_service_name_falls_back_to_path() {
        let out = outbound("trojan://p@1.2.3.4:443?type=grpc&path=svc");
        assert_eq!(out["streamSettings"]["grpcSettings"]["serviceName"], "svc");
        let out = outbound("vless://u@1.2.3.4:443?type=grpc&serviceName=named&path=svc");
        assert_eq!(out["streamSettings"]["grpcSettings"]["serviceName"], "named");
    }

    #[test]
    fn test_vmess_empty_tls_becomes_none() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        let uri = format!(
            "vmess://{}",
            STANDARD.encode(r#"{"add":"1.2.3.4","port":"8080","id":"u","net":"http","host":"h.example.com","path":"/p"}"#)
        );
        let out = outbound(&uri);
        let stream = &out["streamSettings"];
        assert_eq!(stream["security"], "none");
        assert!(stream.get("tlsSettings").is_none());
        assert_eq!(stream["httpSettings"]["host"][0], "h.example.com");
        assert_eq!(out["settings"]["vnext"][0]["port"], 8080);
    }

    #[test]
    fn test_shadowsocks_has_no_stream_settings() {
        let out = outbound("ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388");
        assert_eq!(out["protocol"], "shadowsocks");
        assert_eq!(out["settings"]["servers"][0]["method"], "aes-256-gcm");
        assert!(out.get("streamSettings").is_none());
    }

    #[test]
    fn test_zero_port_falls_back() {
        // Parsers reject port 0; only hand-built records can carry it
        let mut record = parse_descriptor("trojan://p@1.2.3.4:443").unwrap();
        if let Endpoint::Trojan(e) = &mut record.endpoint {
            e.port = 0;
        }
        let out = build_engine_config(&record, 10_007)["outbounds"][0].clone();
        assert_eq!(
            out["settings"]["servers"][0]["port"],
            u64::from(FALLBACK_OUTBOUND_PORT)
        );
    }

    #[test]
    fn test_trojan_defaults_to_tls_with_address_as_server_name() {
        let out = outbound("trojan://p@tr.example.com:443");
        assert_eq!(out["streamSettings"]["security"], "tls");
        assert_eq!(
            out["streamSettings"]["tlsSettings"]["serverName"],
            "tr.example.com"
        );
    }
}
