//! Gateway error taxonomy and its HTTP rendering.
//!
//! Every failure a handler can hit ends up here and is answered with a JSON body of the form
//! `{"error": ...}`. Upstream failures keep the upstream status code and body.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

pub const MISSING_API_KEY: &str = "API key not configured on server";
pub const NO_FILE_PROVIDED: &str = "No file provided";
pub const GENERIC_FAILURE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider key is not configured; nothing is sent upstream.
    #[error("{}", MISSING_API_KEY)]
    Configuration,

    #[error("{0}")]
    BadRequest(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// Inbound body could not be buffered (too large, broken stream).
    #[error("Unreadable request body: {0}")]
    Body(#[from] BytesRejection),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream returned {status}")]
    Upstream { status: StatusCode, body: Option<Value> },

    /// No upstream response at all (connect failure, timeout, broken body).
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Body(e) => e.status(),
            Self::Upstream { status, .. } => *status,
        }
    }

    /// What the caller sees under `error`
    fn payload(&self) -> Value {
        match self {
            Self::Configuration => Value::String(MISSING_API_KEY.to_string()),
            Self::BadRequest(msg) => Value::String(msg.clone()),
            Self::Multipart(e) => Value::String(e.body_text()),
            Self::Body(e) => Value::String(e.body_text()),
            Self::Upstream { body: Some(body), .. } => body.clone(),
            Self::Upstream { body: None, .. } | Self::Transport(_) => {
                Value::String(GENERIC_FAILURE.to_string())
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.payload() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: GatewayError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn configuration_error_is_500() {
        let (status, body) = render(GatewayError::Configuration).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": MISSING_API_KEY }));
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let (status, body) = render(GatewayError::BadRequest(NO_FILE_PROVIDED.into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file provided" }));
    }

    #[tokio::test]
    async fn upstream_body_is_wrapped_verbatim() {
        let err = GatewayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: Some(json!({ "error": "rate limited" })),
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({ "error": { "error": "rate limited" } }));
    }

    #[tokio::test]
    async fn empty_upstream_body_keeps_status() {
        let err = GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            body: None,
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": GENERIC_FAILURE }));
    }
}
