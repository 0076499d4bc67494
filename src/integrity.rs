//! Content Hash Engine
//!
//! Deterministic digests over record payloads. A payload is first rendered
//! as canonical JSON (object keys sorted at every depth, no insignificant
//! whitespace) and then hashed with SHA-256 under a domain separator, so two
//! logically equal payloads hash identically regardless of field insertion
//! order, process or platform.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

const DOMAIN_PREFIX: &str = "srs-ledger";
const DOMAIN_VERSION: &str = "v1";

/// Render `value` as canonical JSON.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json string escaping is itself deterministic
    out.push_str(&Value::String(s.to_string()).to_string());
}

/// Canonical byte form of any serializable payload.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(payload)?;
    Ok(canonical_json(&value).into_bytes())
}

/// Compute the hex SHA-256 digest of `payload` within `domain`.
pub fn digest<T: Serialize>(domain: &str, payload: &T) -> Result<String> {
    let canonical = canonical_bytes(payload)?;
    Ok(digest_bytes(domain, &canonical))
}

/// Hash already-canonical bytes within `domain`.
pub fn digest_bytes(domain: &str, canonical: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_PREFIX.as_bytes());
    hasher.update(b":");
    hasher.update(domain.as_bytes());
    hasher.update(b":");
    hasher.update(DOMAIN_VERSION.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical);
    hex::encode(hasher.finalize())
}

/// Whether `candidate` looks like a digest produced by this module.
pub fn is_digest(candidate: &str) -> bool {
    candidate.len() == DIGEST_HEX_LEN && candidate.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
