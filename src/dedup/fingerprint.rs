//! Connection-identity fingerprints.

use std::fmt::{self, Write};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::descriptor::CanonicalRecord;

/// Lowercase hex SHA-256 over the identity-bearing fields of a record.
///
/// The protocol name is hashed in front of the fields so two protocols that happen
/// to share an address, port and secret never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(record: &CanonicalRecord) -> Fingerprint {
        let mut core = String::from(record.protocol().as_ref());
        for field in record.endpoint.identity_fields() {
            core.push('|');
            core.push_str(&field);
        }
        Fingerprint(sha256_hex(&core))
    }

    /// Whole-document hash for entries whose protocol is not one of the four
    /// known families. Object keys are hashed in sorted order.
    pub fn of_document(document: &Value) -> Fingerprint {
        let mut canonical = String::from("unknown|");
        write_sorted(&mut canonical, document);
        Fingerprint(sha256_hex(&canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sha256_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

// serde_json's Map order depends on crate features, so keys are sorted here
fn write_sorted(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(key) {
                    write_sorted(out, inner);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
