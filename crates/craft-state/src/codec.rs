//! Canonical record encoding.
//!
//! Stored records are UTF-8 JSON objects with keys sorted lexicographically
//! at every nesting level, so hash-of-state comparisons are deterministic
//! across nodes. Sorting falls out of routing serialization through
//! [`serde_json::Value`], whose object map is a `BTreeMap`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StateError;

/// Encode a record into its canonical stored form.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, StateError> {
    let value = serde_json::to_value(record)
        .map_err(|e| StateError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| StateError::Serialization(e.to_string()))
}

/// Decode stored bytes back into a record. Malformed input fails with
/// [`StateError::Decode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StateError> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde::Deserialize;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        zebra: String,
        alpha: u32,
        nested: BTreeMap<String, Vec<String>>,
    }

    #[test]
    fn keys_are_sorted_regardless_of_declaration_order() {
        let record = Record {
            zebra: "z".into(),
            alpha: 1,
            nested: BTreeMap::new(),
        };
        let text = String::from_utf8(encode(&record).unwrap()).unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        let nested = text.find("\"nested\"").unwrap();
        let zebra = text.find("\"zebra\"").unwrap();
        assert!(alpha < nested && nested < zebra);
    }

    #[test]
    fn round_trip_preserves_records() {
        let mut nested = BTreeMap::new();
        nested.insert("k".to_string(), vec!["v1".to_string(), "v2".to_string()]);
        let record = Record {
            zebra: "stripes".into(),
            alpha: 42,
            nested,
        };
        let decoded: Record = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn malformed_bytes_fail_with_decode_error() {
        let err = decode::<Record>(b"{not json").unwrap_err();
        assert!(matches!(err, StateError::Decode(_)));
    }

    proptest! {
        #[test]
        fn arbitrary_maps_round_trip(map in proptest::collection::btree_map(
            "[a-z_]{1,12}", any::<u32>(), 0..8,
        )) {
            let decoded: BTreeMap<String, u32> = decode(&encode(&map).unwrap()).unwrap();
            prop_assert_eq!(decoded, map);
        }
    }
}
