// --- File: crates/relay_common/src/dispatch.rs ---
//! The data-driven API client.
//!
//! An integration is described, not coded: a static [`IntegrationSpec`]
//! carries the base URL, the auth scheme, the credential specs and one
//! [`EndpointSpec`] per upstream operation. [`ApiClient`] interprets the
//! table: it renders the path template, builds sparse query/body payloads
//! (absent and null arguments are never sent), attaches auth and maps the
//! response. Upstream failures come back as [`RelayError::Upstream`] with
//! the message dug out of the upstream error body.

use futures::future::try_join_all;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::credentials::{CredentialBundle, CredentialSpec};
use crate::error::{internal_error, validation_error, RelayError};

/// Where a declared parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

/// How a parameter value is serialized on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Scalars as-is; JSON bodies may also carry arrays/objects verbatim.
    Verbatim,
    /// Arrays joined into `a,b,c`, the convention of several upstreams.
    CommaList,
}

/// How the request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub location: ParamLocation,
    pub required: bool,
    pub style: ParamStyle,
}

impl ParamSpec {
    pub const fn required(name: &'static str, location: ParamLocation) -> Self {
        ParamSpec {
            name,
            location,
            required: true,
            style: ParamStyle::Verbatim,
        }
    }

    pub const fn optional(name: &'static str, location: ParamLocation) -> Self {
        ParamSpec {
            name,
            location,
            required: false,
            style: ParamStyle::Verbatim,
        }
    }

    pub const fn comma_list(name: &'static str, location: ParamLocation, required: bool) -> Self {
        ParamSpec {
            name,
            location,
            required,
            style: ParamStyle::CommaList,
        }
    }
}

/// How outbound requests authenticate. Credential names refer to the
/// integration's [`CredentialSpec`] table.
#[derive(Debug, Clone, Copy)]
pub enum AuthScheme {
    Bearer { cred: &'static str },
    Header { name: &'static str, cred: &'static str },
    Basic { user_cred: &'static str, password_cred: Option<&'static str> },
    Query { name: &'static str, cred: &'static str },
    None,
}

/// One upstream operation. `path` doubles as the axum route and the
/// upstream path template (`/videos/{video_id}`).
#[derive(Debug)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    pub body: BodyKind,
    /// Envelope field the upstream payload is returned under.
    pub response_key: &'static str,
    /// Optional JSON pointer picked out of the upstream body before
    /// wrapping, e.g. `/data` for list endpoints or `/deleted` for a
    /// deletion flag. The whole body is kept when the pointer is absent.
    pub response_pick: Option<&'static str>,
}

/// A complete integration description.
#[derive(Debug)]
pub struct IntegrationSpec {
    pub name: &'static str,
    pub base_url: &'static str,
    pub auth: AuthScheme,
    pub credentials: &'static [CredentialSpec],
    pub endpoints: &'static [EndpointSpec],
}

impl IntegrationSpec {
    pub fn endpoint(&self, name: &str) -> Option<&'static EndpointSpec> {
        self.endpoints.iter().find(|ep| ep.name == name)
    }
}

/// The generic dispatcher: one per request, but it borrows the pooled
/// `reqwest::Client` held by the integration's router, so no connection
/// state is rebuilt per call.
pub struct ApiClient {
    spec: &'static IntegrationSpec,
    http: Client,
    base_url: String,
    bundle: CredentialBundle,
}

impl ApiClient {
    pub fn new(
        spec: &'static IntegrationSpec,
        http: Client,
        base_url: impl Into<String>,
        bundle: CredentialBundle,
    ) -> Self {
        ApiClient {
            spec,
            http,
            base_url: base_url.into(),
            bundle,
        }
    }

    pub fn spec(&self) -> &'static IntegrationSpec {
        self.spec
    }

    pub fn credentials(&self) -> &CredentialBundle {
        &self.bundle
    }

    /// Executes one endpoint against the upstream.
    ///
    /// 2xx answers yield the parsed JSON body (null for an empty body);
    /// everything else is a typed error for the boundary to wrap.
    pub async fn call(
        &self,
        ep: &EndpointSpec,
        args: &Map<String, Value>,
    ) -> Result<Value, RelayError> {
        let path = render_path(ep.path, args)?;
        let url = format!("{}{}", self.base_url, path);

        let query = build_pairs(ep, ParamLocation::Query, args)?;
        let mut request = self.http.request(ep.method.clone(), &url);
        if !query.is_empty() {
            request = request.query(&query);
        }
        request = apply_auth(request, &self.spec.auth, &self.bundle)?;
        request = match ep.body {
            BodyKind::Json => request.json(&Value::Object(build_json_body(ep, args)?)),
            BodyKind::Form => request.form(&build_pairs(ep, ParamLocation::Body, args)?),
            BodyKind::Empty => request,
        };

        debug!(
            integration = self.spec.name,
            endpoint = ep.name,
            %url,
            "dispatching upstream request"
        );

        let response = request.send().await?;
        let status = response.status();
        let body_text = response.text().await?;

        if status.is_success() {
            if body_text.trim().is_empty() {
                return Ok(Value::Null);
            }
            let parsed: Value = serde_json::from_str(&body_text)
                .map_err(|e| RelayError::Parse(format!("{}: {}", ep.name, e)))?;
            Ok(match ep.response_pick {
                Some(pointer) => parsed.pointer(pointer).cloned().unwrap_or(parsed),
                None => parsed,
            })
        } else {
            let message = extract_error_message(status.as_u16(), &body_text);
            warn!(
                integration = self.spec.name,
                endpoint = ep.name,
                status = status.as_u16(),
                %message,
                "upstream request failed"
            );
            Err(RelayError::Upstream {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Concurrent fan-out over one endpoint, fail-fast: the first failing
    /// sub-call aborts the batch and no partial results are returned.
    pub async fn call_batch(
        &self,
        ep: &EndpointSpec,
        arg_sets: Vec<Map<String, Value>>,
    ) -> Result<Vec<Value>, RelayError> {
        try_join_all(arg_sets.iter().map(|args| self.call(ep, args))).await
    }
}

/// Substitutes `{name}` segments from the argument map.
pub fn render_path(template: &str, args: &Map<String, Value>) -> Result<String, RelayError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| internal_error(format!("unterminated path template: {}", template)))?;
        let name = &after[..end];
        let value = args
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| validation_error(format!("missing path parameter '{}'", name)))?;
        out.push_str(&scalar_to_string(name, value)?);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn scalar_to_string(name: &str, value: &Value) -> Result<String, RelayError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(validation_error(format!(
            "parameter '{}' must be a scalar value",
            name
        ))),
    }
}

/// Builds stringified key/value pairs for query strings and form bodies.
/// Absent and null arguments are skipped; a missing required argument is a
/// validation error.
fn build_pairs(
    ep: &EndpointSpec,
    location: ParamLocation,
    args: &Map<String, Value>,
) -> Result<Vec<(String, String)>, RelayError> {
    let mut pairs = Vec::new();
    for param in ep.params.iter().filter(|p| p.location == location) {
        match args.get(param.name).filter(|v| !v.is_null()) {
            Some(Value::Array(items)) if param.style == ParamStyle::CommaList => {
                let joined = items
                    .iter()
                    .map(|item| scalar_to_string(param.name, item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",");
                pairs.push((param.name.to_string(), joined));
            }
            Some(value) => {
                pairs.push((param.name.to_string(), scalar_to_string(param.name, value)?));
            }
            None if param.required => {
                return Err(validation_error(format!(
                    "missing required parameter '{}'",
                    param.name
                )));
            }
            None => {}
        }
    }
    Ok(pairs)
}

/// Builds a sparse JSON body: only declared, present, non-null arguments
/// are forwarded. Arrays and objects pass through verbatim.
fn build_json_body(
    ep: &EndpointSpec,
    args: &Map<String, Value>,
) -> Result<Map<String, Value>, RelayError> {
    let mut body = Map::new();
    for param in ep.params.iter().filter(|p| p.location == ParamLocation::Body) {
        match args.get(param.name).filter(|v| !v.is_null()) {
            Some(Value::Array(items)) if param.style == ParamStyle::CommaList => {
                let joined = items
                    .iter()
                    .map(|item| scalar_to_string(param.name, item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(",");
                body.insert(param.name.to_string(), Value::String(joined));
            }
            Some(value) => {
                body.insert(param.name.to_string(), value.clone());
            }
            None if param.required => {
                return Err(validation_error(format!(
                    "missing required parameter '{}'",
                    param.name
                )));
            }
            None => {}
        }
    }
    Ok(body)
}

fn apply_auth(
    request: RequestBuilder,
    auth: &AuthScheme,
    bundle: &CredentialBundle,
) -> Result<RequestBuilder, RelayError> {
    Ok(match auth {
        AuthScheme::Bearer { cred } => request.bearer_auth(bundle.expect(cred)?),
        AuthScheme::Header { name, cred } => request.header(*name, bundle.expect(cred)?),
        AuthScheme::Basic {
            user_cred,
            password_cred,
        } => {
            let user = bundle.expect(user_cred)?;
            let password = match password_cred {
                Some(cred) => Some(bundle.expect(cred)?),
                None => None,
            };
            request.basic_auth(user, password)
        }
        AuthScheme::Query { name, cred } => request.query(&[(*name, bundle.expect(cred)?)]),
        AuthScheme::None => request,
    })
}

/// Digs a human-readable message out of an upstream error body. Tries the
/// common shapes (`error.message`, `error`, `message`) before falling back
/// to the raw body, then the status code.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| json.get("error").and_then(Value::as_str))
            .or_else(|| json.get("message").and_then(Value::as_str))
        {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("upstream returned HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    static VIDEO_QUERY: EndpointSpec = EndpointSpec {
        name: "query_videos",
        method: Method::GET,
        path: "/video/query/{user_id}",
        params: &[
            ParamSpec::required("user_id", ParamLocation::Path),
            ParamSpec::comma_list("fields", ParamLocation::Query, false),
            ParamSpec::optional("cursor", ParamLocation::Query),
        ],
        body: BodyKind::Empty,
        response_key: "videos",
        response_pick: None,
    };

    #[test]
    fn render_path_substitutes_scalars() {
        let rendered = render_path("/video/query/{user_id}", &args(json!({"user_id": 42}))).unwrap();
        assert_eq!(rendered, "/video/query/42");
    }

    #[test]
    fn render_path_rejects_missing_or_null_params() {
        let err = render_path("/video/query/{user_id}", &args(json!({}))).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        let err =
            render_path("/video/query/{user_id}", &args(json!({"user_id": null}))).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn query_pairs_skip_absent_and_null_values() {
        let pairs = build_pairs(
            &VIDEO_QUERY,
            ParamLocation::Query,
            &args(json!({"user_id": "u1", "cursor": null})),
        )
        .unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn comma_list_joins_arrays() {
        let pairs = build_pairs(
            &VIDEO_QUERY,
            ParamLocation::Query,
            &args(json!({"fields": ["id", "title", "view_count"]})),
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![("fields".to_string(), "id,title,view_count".to_string())]
        );
    }

    #[test]
    fn json_body_is_sparse() {
        static CREATE: EndpointSpec = EndpointSpec {
            name: "create",
            method: Method::POST,
            path: "/things",
            params: &[
                ParamSpec::required("name", ParamLocation::Body),
                ParamSpec::optional("description", ParamLocation::Body),
                ParamSpec::optional("tags", ParamLocation::Body),
            ],
            body: BodyKind::Json,
            response_key: "thing",
            response_pick: None,
        };
        let body = build_json_body(&CREATE, &args(json!({"name": "a", "description": null})))
            .unwrap();
        assert_eq!(Value::Object(body), json!({"name": "a"}));
    }

    #[test]
    fn missing_required_body_param_is_rejected() {
        static CREATE: EndpointSpec = EndpointSpec {
            name: "create",
            method: Method::POST,
            path: "/things",
            params: &[ParamSpec::required("name", ParamLocation::Body)],
            body: BodyKind::Json,
            response_key: "thing",
            response_pick: None,
        };
        let err = build_json_body(&CREATE, &args(json!({}))).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn error_message_extraction_prefers_structured_shapes() {
        assert_eq!(
            extract_error_message(402, r#"{"error":{"message":"Your card was declined."}}"#),
            "Your card was declined."
        );
        assert_eq!(
            extract_error_message(401, r#"{"error":"invalid_token"}"#),
            "invalid_token"
        );
        assert_eq!(
            extract_error_message(500, r#"{"message":"boom"}"#),
            "boom"
        );
        assert_eq!(extract_error_message(502, "gateway timeout"), "gateway timeout");
        assert_eq!(extract_error_message(503, "  "), "upstream returned HTTP 503");
    }
}
