//! Stable JSON encoding.
//!
//! Default serde formatting of a struct writes fields in declaration order,
//! which is not a canonical form. Canonical bytes are produced by converting
//! the value to `serde_json::Value` first: `serde_json::Map` is backed by a
//! BTreeMap, so object keys always serialize sorted, and the compact writer
//! uses `,`/`:` separators with no whitespace.

use serde::Serialize;
use serde_json::Value;

use crate::errors::EqlabResult;

/// Canonical compact JSON string of any serializable value.
pub fn stable_json_string<T: Serialize>(value: &T) -> EqlabResult<String> {
    let value: Value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Canonical compact JSON bytes of any serializable value.
pub fn stable_json_bytes<T: Serialize>(value: &T) -> EqlabResult<Vec<u8>> {
    Ok(stable_json_string(value)?.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Unsorted {
        zebra: u32,
        apple: u32,
    }

    #[test]
    fn keys_sorted_and_compact() {
        let text = stable_json_string(&Unsorted { zebra: 1, apple: 2 }).unwrap();
        assert_eq!(text, r#"{"apple":2,"zebra":1}"#);
    }

    #[test]
    fn nested_objects_sorted() {
        let value = serde_json::json!({
            "b": {"y": 1, "x": 2},
            "a": [ {"q": 1, "p": 2} ],
        });
        let text = stable_json_string(&value).unwrap();
        assert_eq!(text, r#"{"a":[{"p":2,"q":1}],"b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn encoding_is_stable() {
        let value = serde_json::json!({"k": [1, 2, 3], "s": "v"});
        assert_eq!(
            stable_json_string(&value).unwrap(),
            stable_json_string(&value).unwrap()
        );
    }
}
