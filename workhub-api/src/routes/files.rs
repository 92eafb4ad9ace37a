/// File endpoints (file service)
///
/// # Endpoints
///
/// - `POST /files/upload` - One file in multipart field `file`
/// - `POST /files/upload-multiple` - Up to ten files in multipart field `files`
/// - `GET /files/:key` - Download a locally stored file
/// - `GET /files/:key/signed-url?expires_in=N` - Time-limited download URL
/// - `DELETE /files/:key` - Delete a file
///
/// Every upload is staged in the uploads directory before being published,
/// see [`workhub_shared::storage`].

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Request, State,
    },
    http::{header, HeaderMap},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use workhub_shared::storage::{StagedFile, StorageError, StoredFile};

use crate::{
    app::FileState,
    config::FileConfig,
    error::{ApiError, ApiResult},
    extract::{Param, QueryParams},
    response::{Envelope, Record},
};

const UPLOAD_FAILED: &str = "File upload failed";
const DELETE_FAILED: &str = "File deletion failed";

/// Default lifetime of a signed URL, in seconds
pub const DEFAULT_SIGNED_URL_TTL: u64 = 3600;

/// Longest lifetime S3 accepts for a presigned URL (7 days)
pub const MAX_SIGNED_URL_TTL: u64 = 7 * 24 * 3600;

#[derive(Debug, Deserialize)]
pub struct SignedUrlParams {
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadedFiles {
    pub files: Vec<StoredFile>,
}

pub fn router() -> Router<FileState> {
    Router::new()
        .route("/files/upload", post(upload_file))
        .route("/files/upload-multiple", post(upload_multiple))
        .route("/files/:key", get(download_file).delete(delete_file))
        .route("/files/:key/signed-url", get(signed_url))
}

/// Base of local file URLs: configured, or derived from the request
fn public_base(files: &FileConfig, headers: &HeaderMap) -> String {
    if let Some(base) = &files.public_base_url {
        return base.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    format!("{scheme}://{host}")
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::BadRequest(err.body_text())
}

/// Stages every file sent under `field_name`
///
/// On any error the files staged so far are removed again.
async fn stage_files(
    state: &FileState,
    mut multipart: Multipart,
    field_name: &str,
    max_files: usize,
) -> ApiResult<Vec<StagedFile>> {
    let mut staged = Vec::new();

    let result: ApiResult<()> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(field_name) {
                continue;
            }
            let Some(original_name) = field.file_name().map(str::to_string) else {
                continue;
            };

            if staged.len() == max_files {
                return Err(ApiError::BadRequest(format!(
                    "Too many files: at most {} allowed",
                    max_files
                )));
            }

            let mimetype = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(multipart_error)?;

            if data.len() > state.files.max_file_size {
                return Err(ApiError::BadRequest(format!(
                    "File too large: limit is {} bytes",
                    state.files.max_file_size
                )));
            }

            let file = state
                .storage
                .stage(&original_name, &mimetype, data)
                .await
                .map_err(|e| ApiError::internal_with(UPLOAD_FAILED, e))?;
            staged.push(file);
        }
        Ok(())
    }
    .await;

    if let Err(e) = result {
        for file in &staged {
            state.storage.discard(file).await;
        }
        return Err(e);
    }

    Ok(staged)
}

/// Uploads a single file
///
/// # Errors
///
/// - `400 Bad Request`: No file in field `file`, or file too large
pub async fn upload_file(
    State(state): State<FileState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Record<StoredFile>> {
    let mut staged = stage_files(&state, multipart?, "file", 1).await?;
    let file = staged
        .pop()
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let stored = state
        .storage
        .upload(file, &public_base(&state.files, &headers))
        .await;

    tracing::info!(key = %stored.key, size = stored.size, "File uploaded");

    Ok(Envelope::record("file", stored)
        .created()
        .with_message("File uploaded successfully"))
}

/// Uploads up to ten files, each with its own remote/local fallback
pub async fn upload_multiple(
    State(state): State<FileState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Envelope<UploadedFiles>> {
    let staged = stage_files(&state, multipart?, "files", FileConfig::MAX_FILES).await?;
    if staged.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let files = state
        .storage
        .upload_all(staged, &public_base(&state.files, &headers))
        .await;

    tracing::info!(count = files.len(), "Files uploaded");

    let message = format!("{} files uploaded successfully", files.len());
    Ok(Envelope::data(UploadedFiles { files })
        .created()
        .with_message(message))
}

/// Deletes a file from the remote store (when enabled) and local disk
pub async fn delete_file(
    State(state): State<FileState>,
    Param(key): Param<String>,
) -> ApiResult<Envelope> {
    state.storage.delete(&key).await.map_err(|e| match e {
        StorageError::InvalidKey(_) => ApiError::from(e),
        other => ApiError::internal_with(DELETE_FAILED, other),
    })?;

    tracing::info!(key = %key, "File deleted");

    Ok(Envelope::message("File deleted successfully"))
}

/// Returns a time-limited download URL
///
/// Presigned in remote mode; the plain local URL otherwise.
pub async fn signed_url(
    State(state): State<FileState>,
    Param(key): Param<String>,
    QueryParams(params): QueryParams<SignedUrlParams>,
    headers: HeaderMap,
) -> ApiResult<Envelope<SignedUrl>> {
    let expires_in = params.expires_in.unwrap_or(DEFAULT_SIGNED_URL_TTL);
    if !(1..=MAX_SIGNED_URL_TTL).contains(&expires_in) {
        return Err(ApiError::BadRequest(format!(
            "expires_in must be between 1 and {} seconds",
            MAX_SIGNED_URL_TTL
        )));
    }

    let url = state
        .storage
        .sign_url(
            &key,
            std::time::Duration::from_secs(expires_in),
            &public_base(&state.files, &headers),
        )
        .await?;

    Ok(Envelope::data(SignedUrl { url, expires_in }))
}

/// Streams a file from the uploads directory
pub async fn download_file(
    State(state): State<FileState>,
    Param(key): Param<String>,
    request: Request,
) -> ApiResult<Response> {
    let path = state.storage.local_path(&key)?;

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(ApiError::NotFound("File not found".to_string())),
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.map(Body::new))
}
