//! Content fingerprints and deterministic plan ids.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const NAMESPACE: Uuid = Uuid::from_bytes([
    0x7c, 0x1e, 0x52, 0x9a, 0x3d, 0x44, 0x4f, 0x0b, 0x91, 0x6a, 0x2e, 0x8f, 0xc3, 0x15, 0x70, 0xd4,
]);

/// sha256 (hex) of the canonical JSON form of `value`.
pub fn fingerprint<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let json = serde_json::to_value(value)?;
    let canonical = canonicalize_json(&json);
    let s = serde_json::to_string(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// v5 id over the ordered fingerprints of every planned shape and failure key.
pub fn plan_id<'a>(parts: impl IntoIterator<Item = &'a str>) -> Uuid {
    let stable_key = parts.into_iter().collect::<Vec<_>>().join("|");
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}

fn canonicalize_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                if let Some(v) = map.get(&k) {
                    out.insert(k, canonicalize_json(v));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize_json).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_key_order_independent() {
        let a = serde_json::json!({"b": 1, "a": {"z": 2, "y": 3}});
        let b = serde_json::json!({"a": {"y": 3, "z": 2}, "b": 1});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_eq!(fingerprint(&a).unwrap().len(), 64);
    }

    #[test]
    fn plan_id_is_stable_and_order_sensitive() {
        let first = plan_id(["aa", "bb"]);
        assert_eq!(first, plan_id(["aa", "bb"]));
        assert_ne!(first, plan_id(["bb", "aa"]));
        assert_eq!(first.get_version_num(), 5);
    }
}
