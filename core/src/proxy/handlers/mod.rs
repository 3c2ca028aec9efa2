// Route handlers

pub mod nanobana;
pub mod storage;

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::Value;

use crate::config::ApiKey;
use crate::error::GatewayError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::UpstreamReply;

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Credential check shared by every route that talks to upstream
fn require_key(state: &AppState) -> Result<&ApiKey, GatewayError> {
    state.api_key.as_ref().ok_or(GatewayError::Configuration)
}

/// Log a failed upstream call under a route label, then hand the error back for rendering
fn log_failure(label: &str, err: GatewayError) -> GatewayError {
    match &err {
        GatewayError::Upstream { status, body } => {
            let body = body.as_ref().map(ToString::to_string).unwrap_or_default();
            tracing::error!("{}: upstream {} {}", label, status, body);
        }
        other => tracing::error!("{}: {}", label, other),
    }
    err
}

/// Decode an inbound JSON body once the credential check has passed.
///
/// A body sent without a JSON content type, or an empty one, becomes `{}`.
fn json_body(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Value, GatewayError> {
    let body = body?;
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn json_body_is_parsed() {
        let value = json_body(
            &headers("application/json; charset=utf-8"),
            Ok(Bytes::from_static(br#"{"prompt":"x"}"#)),
        )
        .unwrap();
        assert_eq!(value, json!({ "prompt": "x" }));
    }

    #[test]
    fn non_json_content_type_becomes_empty_object() {
        let value = json_body(&headers("text/plain"), Ok(Bytes::from_static(b"hello"))).unwrap();
        assert_eq!(value, json!({}));

        let value = json_body(&HeaderMap::new(), Ok(Bytes::from_static(b"{}"))).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn empty_json_body_becomes_empty_object() {
        let value = json_body(&headers("application/json"), Ok(Bytes::new())).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = json_body(&headers("application/json"), Ok(Bytes::from_static(b"{oops")))
            .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }
}
