// --- File: crates/relay_common/src/credentials.rs ---
//! Credential bundles: the set of secrets one upstream needs, resolved per
//! request with a fixed precedence: request body field, then request
//! header, then process environment variable.

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{validation_error, RelayError};

/// Declares one secret an integration needs and where it may come from.
#[derive(Debug, Clone, Copy)]
pub struct CredentialSpec {
    /// Field name looked up in the request body (and bundle key).
    pub name: &'static str,
    /// Request header, e.g. `x-anthropic-api-key`.
    pub header: &'static str,
    /// Environment variable, e.g. `ANTHROPIC_API_KEY`.
    pub env: &'static str,
    pub required: bool,
}

impl CredentialSpec {
    pub const fn required(name: &'static str, header: &'static str, env: &'static str) -> Self {
        CredentialSpec {
            name,
            header,
            env,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, header: &'static str, env: &'static str) -> Self {
        CredentialSpec {
            name,
            header,
            env,
            required: false,
        }
    }
}

/// The resolved secrets for one request. Lifetime is one dispatch; nothing
/// is cached across requests.
#[derive(Debug, Default, Clone)]
pub struct CredentialBundle {
    values: HashMap<&'static str, String>,
}

impl CredentialBundle {
    /// Resolves every declared credential. Body beats header beats env, per
    /// field. A missing required credential fails before any upstream call.
    pub fn resolve(
        specs: &'static [CredentialSpec],
        body: Option<&Map<String, Value>>,
        headers: &HeaderMap,
    ) -> Result<Self, RelayError> {
        let mut values = HashMap::new();
        for spec in specs {
            let from_body = body
                .and_then(|b| b.get(spec.name))
                .and_then(Value::as_str)
                .map(str::to_string);
            let from_header = headers
                .get(spec.header)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let resolved = from_body
                .or(from_header)
                .or_else(|| std::env::var(spec.env).ok())
                .filter(|v| !v.is_empty());

            match resolved {
                Some(value) => {
                    values.insert(spec.name, value);
                }
                None if spec.required => {
                    return Err(validation_error(format!(
                        "missing credential '{}' (body field, {} header or {} env var)",
                        spec.name, spec.header, spec.env
                    )));
                }
                None => {}
            }
        }
        Ok(CredentialBundle { values })
    }

    /// Builds a bundle directly from explicit values, for callers that do
    /// not go through the HTTP layer.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, String)>,
    {
        CredentialBundle {
            values: values.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn expect(&self, name: &str) -> Result<&str, RelayError> {
        self.get(name)
            .ok_or_else(|| validation_error(format!("missing credential '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    static SPECS: &[CredentialSpec] = &[CredentialSpec::required(
        "api_key",
        "x-testsvc-api-key",
        "RELAY_TEST_CRED_PRECEDENCE",
    )];

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-testsvc-api-key", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn body_beats_header_beats_env() {
        std::env::set_var("RELAY_TEST_CRED_PRECEDENCE", "from-env");

        let body = json!({"api_key": "from-body"});
        let bundle = CredentialBundle::resolve(
            SPECS,
            body.as_object(),
            &headers_with("from-header"),
        )
        .unwrap();
        assert_eq!(bundle.get("api_key"), Some("from-body"));

        let bundle =
            CredentialBundle::resolve(SPECS, None, &headers_with("from-header")).unwrap();
        assert_eq!(bundle.get("api_key"), Some("from-header"));

        let bundle = CredentialBundle::resolve(SPECS, None, &HeaderMap::new()).unwrap();
        assert_eq!(bundle.get("api_key"), Some("from-env"));

        std::env::remove_var("RELAY_TEST_CRED_PRECEDENCE");
    }

    #[test]
    fn missing_required_credential_is_a_validation_error() {
        static MISSING: &[CredentialSpec] = &[CredentialSpec::required(
            "token",
            "x-testsvc-token",
            "RELAY_TEST_CRED_MISSING",
        )];
        let err = CredentialBundle::resolve(MISSING, None, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn optional_credential_may_be_absent() {
        static OPTIONAL: &[CredentialSpec] = &[CredentialSpec::optional(
            "password",
            "x-testsvc-password",
            "RELAY_TEST_CRED_OPTIONAL",
        )];
        let bundle = CredentialBundle::resolve(OPTIONAL, None, &HeaderMap::new()).unwrap();
        assert_eq!(bundle.get("password"), None);
    }
}
