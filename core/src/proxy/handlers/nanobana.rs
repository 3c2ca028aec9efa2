//! Nano Banana queue handlers
//! Handles /api/nanobana, /api/nanobana/edit and the request status/result lookups

use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::Value;

use super::{json_body, log_failure, require_key};
use crate::error::GatewayError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::{UpstreamReply, Variant};

/// Handle POST /api/nanobana
pub async fn handle_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UpstreamReply, GatewayError> {
    let key = require_key(&state)?;
    let body = json_body(&headers, body)?;

    state
        .upstream
        .post_json(state.endpoints.generate.clone(), key, &body)
        .await
        .map_err(|e| log_failure("Proxy error", e))
}

/// Handle POST /api/nanobana/edit
///
/// Request and response bodies are logged in full to help diagnose rejected edits.
pub async fn handle_edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UpstreamReply, GatewayError> {
    let key = require_key(&state)?;
    let body = json_body(&headers, body)?;

    tracing::info!("Received edit request: {}", pretty(&body));

    match state
        .upstream
        .post_json(state.endpoints.edit.clone(), key, &body)
        .await
    {
        Ok(reply) => {
            tracing::info!("Edit request submitted: {}", pretty(&reply.body));
            Ok(reply)
        }
        Err(e) => {
            tracing::error!("Edit request body was: {}", body);
            Err(log_failure("Edit proxy error", e))
        }
    }
}

/// Handle GET /api/nanobana/requests/:request_id/status
pub async fn handle_generation_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<UpstreamReply, GatewayError> {
    lookup(&state, Variant::Generation, &request_id, true).await
}

/// Handle GET /api/nanobana/requests/:request_id
pub async fn handle_generation_result(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<UpstreamReply, GatewayError> {
    lookup(&state, Variant::Generation, &request_id, false).await
}

/// Handle GET /api/nanobana/edit/requests/:request_id/status
pub async fn handle_edit_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<UpstreamReply, GatewayError> {
    let reply = lookup(&state, Variant::Edit, &request_id, true).await?;
    let status = reply.body.get("status").and_then(Value::as_str).unwrap_or("unknown");
    tracing::info!("Status for {}: {}", request_id, status);
    Ok(reply)
}

/// Handle GET /api/nanobana/edit/requests/:request_id
pub async fn handle_edit_result(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<UpstreamReply, GatewayError> {
    let reply = lookup(&state, Variant::Edit, &request_id, false).await?;
    tracing::info!("Result for {}: {}", request_id, pretty(&reply.body));
    Ok(reply)
}

/// Status (`status = true`) or result lookup for a queued request. No polling happens here;
/// the caller re-invokes until the job is done.
async fn lookup(
    state: &AppState,
    variant: Variant,
    request_id: &str,
    status: bool,
) -> Result<UpstreamReply, GatewayError> {
    let key = require_key(state)?;
    let url = state.endpoints.request_url(variant, request_id, status);

    let label = match (variant, status) {
        (Variant::Generation, true) => "Status error",
        (Variant::Generation, false) => "Result error",
        (Variant::Edit, true) => "Edit status error",
        (Variant::Edit, false) => "Edit result error",
    };

    state
        .upstream
        .get_json(url, key)
        .await
        .map_err(|e| log_failure(label, e))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
