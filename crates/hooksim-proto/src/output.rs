//! Result rendering.
//!
//! Handlers produce a [`serde_json::Value`]; the requested [`Format`] decides
//! how it reaches the charm:
//!
//! - `json`: compact JSON and a trailing newline
//! - `smart`: strings verbatim, `null` as no output, lists of scalars one per
//!   line, anything else as YAML

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    args::Format,
    errors::{ProtocolError, Result},
};

/// Render a handler result in the requested format.
pub fn encode(format: Format, value: &Value) -> Result<Vec<u8>> {
    match format {
        Format::Json => {
            let mut out =
                serde_json::to_vec(value).map_err(|e| ProtocolError::Encoding(e.to_string()))?;
            out.push(b'\n');
            Ok(out)
        },
        Format::Smart => smart(value).map(String::into_bytes),
    }
}

/// Decode JSON output produced with `--format=json`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}

fn smart(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Array(items) if items.iter().all(is_scalar) => {
            Ok(items.iter().map(|item| format!("{}\n", scalar_text(item))).collect())
        },
        Value::Array(_) | Value::Object(_) => {
            serde_yaml::to_string(value).map_err(|e| ProtocolError::Encoding(e.to_string()))
        },
        scalar => Ok(format!("{}\n", scalar_text(scalar))),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn smart_text(value: &Value) -> String {
        String::from_utf8(encode(Format::Smart, value).unwrap()).unwrap()
    }

    #[test]
    fn json_is_compact_with_newline() {
        let out = encode(Format::Json, &json!({"a": ["x", 1]})).unwrap();
        assert_eq!(out, b"{\"a\":[\"x\",1]}\n");
    }

    #[test]
    fn smart_scalars() {
        assert_eq!(smart_text(&json!("secret:abc")), "secret:abc\n");
        assert_eq!(smart_text(&json!(true)), "true\n");
        assert_eq!(smart_text(&Value::Null), "");
    }

    #[test]
    fn smart_scalar_list_is_one_per_line() {
        assert_eq!(smart_text(&json!(["80/tcp", "53/udp"])), "80/tcp\n53/udp\n");
        assert_eq!(smart_text(&json!([])), "");
    }

    #[test]
    fn smart_structures_are_yaml() {
        assert_eq!(smart_text(&json!({"key": "value"})), "key: value\n");
    }

    #[test]
    fn decode_reads_json_output() {
        let ids: Option<Vec<String>> = decode_json(b"null\n").unwrap();
        assert_eq!(ids, None);
    }
}
