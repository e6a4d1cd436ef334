//! Response envelope decoding
//!
//! The engine answers with one JSON document. Object responses may carry a
//! `success` flag and an `error` field that is either a string or an object
//! with `type` and `message`; this module turns that shape into a `Result`.

use crate::{Error, Result};
use serde_json::Value;

/// Parse stdout into exactly one JSON document
pub fn parse_document(stdout: &[u8]) -> Result<Value> {
    let mut stream = serde_json::Deserializer::from_slice(stdout).into_iter::<Value>();

    let first = match stream.next() {
        None => return Err(Error::Protocol("engine produced no response".to_string())),
        Some(Err(e)) => {
            return Err(Error::Protocol(format!(
                "engine produced non-JSON output: {}",
                e
            )))
        }
        Some(Ok(value)) => value,
    };

    match stream.next() {
        None => Ok(first),
        Some(Ok(_)) => Err(Error::Protocol(
            "engine produced more than one response document".to_string(),
        )),
        Some(Err(e)) => Err(Error::Protocol(format!(
            "trailing output after response document: {}",
            e
        ))),
    }
}

/// Split a document into payload or engine failure
pub fn into_result(value: Value) -> Result<Value> {
    if let Value::Object(map) = &value {
        let failed = match map.get("success") {
            Some(Value::Bool(ok)) => !ok,
            Some(_) => {
                return Err(Error::Protocol(
                    "'success' field is not a boolean".to_string(),
                ))
            }
            None => map.contains_key("error"),
        };

        if failed {
            let message = map
                .get("error")
                .map(describe_error)
                .unwrap_or_else(|| "engine reported failure without details".to_string());
            return Err(Error::Process(message));
        }
    }

    Ok(value)
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            match fields.get("type").and_then(Value::as_str) {
                Some(kind) => format!("{}: {}", kind, message),
                None => message.to_string(),
            }
        }
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_document() {
        let value = parse_document(b"  {\"public_key\": \"abc\"}\n").unwrap();
        assert_eq!(value["public_key"], "abc");
    }

    #[test]
    fn test_zero_documents() {
        assert!(matches!(parse_document(b""), Err(Error::Protocol(_))));
        assert!(matches!(parse_document(b"  \n"), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_multiple_documents() {
        let err = parse_document(b"{\"a\":1}\n{\"b\":2}\n").unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_non_json() {
        assert!(matches!(
            parse_document(b"Traceback (most recent call last):"),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            parse_document(b"{\"a\":1} trailing"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_success_envelope_passes_through() {
        let value = into_result(json!({"success": true, "signature": "sig"})).unwrap();
        assert_eq!(value["signature"], "sig");

        assert_eq!(into_result(json!(42)).unwrap(), json!(42));
        assert_eq!(into_result(json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_failure_envelopes() {
        let err = into_result(json!({"success": false, "error": "insufficient funds"})).unwrap_err();
        assert!(matches!(err, Error::Process(ref m) if m == "insufficient funds"));

        let err = into_result(json!({
            "success": false,
            "error": {"type": "DecryptionError", "message": "bad key", "context": "restore"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Process(ref m) if m == "DecryptionError: bad key"));

        // Bare error object without a success flag
        let err = into_result(json!({"error": "Invalid arguments"})).unwrap_err();
        assert!(matches!(err, Error::Process(_)));

        let err = into_result(json!({"success": "yes"})).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
