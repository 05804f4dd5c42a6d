// --- File: crates/relay_common/src/envelope.rs ---
//! The uniform result envelope every Relay operation answers with.
//!
//! Success payloads are flattened into the envelope so the domain field
//! keeps its name on the wire: `{"success":true,"value":null}` for a cache
//! miss, `{"success":true,"message":{...}}` for a chat completion.
//! Failures always carry a non-empty `error` string.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RelayError;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiResult<T> {
    Failure {
        success: bool,
        error: String,
    },
    Success {
        success: bool,
        #[serde(flatten)]
        data: T,
    },
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        ApiResult::Success {
            success: true,
            data,
        }
    }

    pub fn err<M: std::fmt::Display>(message: M) -> Self {
        let message = message.to_string();
        ApiResult::Failure {
            success: false,
            error: if message.is_empty() {
                "unknown error".to_string()
            } else {
                message
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }
}

impl ApiResult<Value> {
    /// Builds a success envelope holding `{<key>: value}`, the shape the
    /// generic dispatcher answers with.
    pub fn keyed(key: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(key.to_string(), value);
        ApiResult::ok(Value::Object(data))
    }
}

impl<T> From<Result<T, RelayError>> for ApiResult<T> {
    fn from(result: Result<T, RelayError>) -> Self {
        match result {
            Ok(data) => ApiResult::ok(data),
            Err(err) => ApiResult::err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct CacheValue {
        value: Option<Value>,
    }

    #[test]
    fn success_flattens_payload_fields() {
        let envelope = ApiResult::keyed("message", json!({"id": "msg_1"}));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire, json!({"success": true, "message": {"id": "msg_1"}}));
    }

    #[test]
    fn null_payload_field_is_preserved_not_dropped() {
        // A cache miss is {"success":true,"value":null}, not an error and
        // not an absent key.
        let envelope = ApiResult::ok(CacheValue { value: None });
        let wire = serde_json::to_string(&envelope).unwrap();
        assert_eq!(wire, r#"{"success":true,"value":null}"#);
    }

    #[test]
    fn failure_always_carries_a_nonempty_error() {
        let envelope = ApiResult::<Value>::err("");
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["success"], json!(false));
        assert!(!wire["error"].as_str().unwrap().is_empty());
    }

    #[test]
    fn upstream_error_converts_via_from() {
        let result: Result<Value, RelayError> = Err(RelayError::Upstream {
            status: 404,
            message: "No such customer".to_string(),
        });
        let envelope: ApiResult<Value> = result.into();
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire, json!({"success": false, "error": "No such customer"}));
    }
}
