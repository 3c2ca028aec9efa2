//! Storage upload handler
//! Handles POST /api/storage/upload (multipart field `file`)

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use serde_json::Value;

use super::{log_failure, require_key};
use crate::error::{GatewayError, NO_FILE_PROVIDED};
use crate::proxy::server::AppState;
use crate::proxy::upstream::{FilePart, UpstreamReply};

/// Inbound multipart field carrying the file
pub const FILE_FIELD: &str = "file";
/// Used when the client sent no filename
pub const DEFAULT_FILENAME: &str = "image.jpg";
/// Used when the client sent no content type for the part
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Handle POST /api/storage/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UpstreamReply, GatewayError> {
    let key = require_key(&state)?;

    // A body that is not multipart at all simply carries no file.
    let file = match multipart {
        Ok(multipart) => read_file_field(multipart)
            .await
            .map_err(|e| log_failure("Upload error", e))?,
        Err(rejection) => {
            tracing::debug!("Upload without multipart body: {}", rejection);
            None
        }
    }
    .ok_or_else(|| GatewayError::BadRequest(NO_FILE_PROVIDED.to_string()))?;

    tracing::info!(
        "Uploading file: {} ({:.2} KB)",
        file.filename,
        file.bytes.len() as f64 / 1024.0
    );

    let reply = state
        .upstream
        .upload(state.endpoints.storage.clone(), key, file)
        .await
        .map_err(|e| log_failure("Upload error", e))?;

    let url = reply.body.get("url").and_then(Value::as_str).unwrap_or("<none>");
    tracing::info!("File uploaded successfully: {}", url);
    Ok(reply)
}

/// First part named `file`; other parts are drained and ignored.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<FilePart>, GatewayError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes: Bytes = field.bytes().await?;

        return Ok(Some(FilePart {
            bytes,
            filename,
            content_type,
        }));
    }

    Ok(None)
}
