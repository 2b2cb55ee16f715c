//! Deterministic JSON encoding for hashing.
//!
//! Object keys are emitted in byte order at every depth, with no
//! insignificant whitespace. Numbers and strings use `serde_json`'s fixed
//! representations, so the output does not depend on platform, locale or
//! the order in which a map was built.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Write;
use vigil_common_core::digest::to_hex;

/// A record could not be canonically encoded.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("record is not serializable: {0}")]
    Unserializable(#[from] serde_json::Error),

    #[error("event must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Encode `record` canonically.
pub fn encode<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, EncodingError> {
    let value = serde_json::to_value(record)?;
    let mut out = Vec::with_capacity(128);
    write_value(&value, &mut out)?;
    Ok(out)
}

/// Hex SHA-256 of the canonical encoding of `record`.
pub fn digest<T: Serialize + ?Sized>(record: &T) -> Result<String, EncodingError> {
    Ok(to_hex(&Sha256::digest(encode(record)?)))
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(&map[key], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::ser::SerializeMap;
    use serde_json::json;
    use std::collections::HashMap;

    /// A map that serializes its entries in exactly the given order.
    struct Ordered(Vec<(String, Value)>);

    impl Serialize for Ordered {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (k, v) in &self.0 {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }

    #[test]
    fn test_keys_sorted_and_compact() {
        let bytes = encode(&json!({"b": 1, "a": {"d": [1, 2.5, "x"], "c": null}})).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"c":null,"d":[1,2.5,"x"]},"b":1}"#
        );
    }

    #[test]
    fn test_string_escaping_is_stable() {
        let bytes = encode(&json!({"k": "line\n\"quoted\"\u{e9}"})).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"k\":\"line\\n\\\"quoted\\\"\u{e9}\"}"
        );
    }

    #[test]
    fn test_non_string_keys_fail() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 2);
        assert!(matches!(
            encode(&map),
            Err(EncodingError::Unserializable(_))
        ));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let d = digest(&json!({"event": "a"})).unwrap();
        assert!(vigil_common_core::is_hex_digest(&d));
        assert_eq!(d, digest(&json!({"event": "a"})).unwrap());
        assert_ne!(d, digest(&json!({"event": "b"})).unwrap());
    }

    proptest! {
        #[test]
        fn test_encoding_is_order_independent(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..16)
        ) {
            let forward: Vec<(String, Value)> =
                entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let mut backward = forward.clone();
            backward.reverse();

            prop_assert_eq!(
                encode(&Ordered(forward)).unwrap(),
                encode(&Ordered(backward)).unwrap()
            );
        }

        #[test]
        fn test_encoding_roundtrips_through_json(
            entries in prop::collection::btree_map("[ -~]{0,12}", "[ -~]{0,12}", 0..8)
        ) {
            let bytes = encode(&entries).unwrap();
            let parsed: std::collections::BTreeMap<String, String> =
                serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(parsed, entries);
        }
    }
}
