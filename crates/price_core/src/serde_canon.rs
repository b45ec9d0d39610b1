//! Canonical JSON serialization for model artifacts
//!
//! Model files are written with sorted object keys and no whitespace so the
//! same forest always produces the same bytes, and therefore the same BLAKE3
//! hash, regardless of field declaration order.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
///
/// Going through `serde_json::Value` sorts object keys at every depth: its
/// `Map` is a `BTreeMap` while the `preserve_order` feature stays off.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    serde_json::to_value(value)
        .and_then(|json| serde_json::to_string(&json))
        .map_err(|e| CanonicalError::SerializationError(e.to_string()))
}

/// BLAKE3 hash of the canonical JSON representation, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Artifact {
        variety: &'static str,
        bias: i64,
        market: &'static str,
    }

    fn artifact(bias: i64) -> Artifact {
        Artifact {
            variety: "Granola",
            bias,
            market: "Welimada",
        }
    }

    #[test]
    fn keys_are_sorted_without_whitespace() {
        let json = to_canonical_json(&artifact(7)).unwrap();
        assert_eq!(json, r#"{"bias":7,"market":"Welimada","variety":"Granola"}"#);
    }

    #[test]
    fn nested_keys_are_sorted() {
        #[derive(Serialize)]
        struct Tree {
            nodes: Vec<Artifact>,
            depth: u8,
        }
        let tree = Tree {
            nodes: vec![artifact(1)],
            depth: 2,
        };
        assert_eq!(
            to_canonical_json(&tree).unwrap(),
            r#"{"depth":2,"nodes":[{"bias":1,"market":"Welimada","variety":"Granola"}]}"#
        );
    }

    #[test]
    fn hash_tracks_content() {
        let h1 = hash_canonical_hex(&artifact(7)).unwrap();
        let h2 = hash_canonical_hex(&artifact(7)).unwrap();
        let h3 = hash_canonical_hex(&artifact(8)).unwrap();

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }
}
