//! POST /process-music
//!
//! Accepts a multipart upload in the `audio_file` field, stages it to a
//! uniquely named temporary file, runs the music workflow and removes the
//! staged file before responding.

use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use sophono_common::api::AnalysisResponse;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// Multipart field carrying the audio file
pub const AUDIO_FIELD: &str = "audio_file";

/// POST /process-music
pub async fn process_music(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("process_music", %request_id);

    async move {
        let Some(upload) = stage_upload(&state.staging_dir, &mut multipart).await? else {
            warn!("Request has no {} field", AUDIO_FIELD);
            let response = AnalysisResponse::error("No file uploaded");
            state.record_outcome(&response).await;
            return Ok(Json(response));
        };

        info!(staged = %upload.path().display(), "Upload staged");
        let response = state.song_analyzer.process_file(upload.path()).await;

        if let Err(e) = upload.close() {
            warn!(error = %e, "Failed to remove staged upload");
        }

        state.record_outcome(&response).await;
        Ok(Json(response))
    }
    .instrument(span)
    .await
}

/// Copy the `audio_file` field into a temp file under `dir`
///
/// Returns `None` when the field is absent. The staged file keeps the
/// upload's extension so the decoder can use it as a format hint, and is
/// deleted when the returned handle drops.
async fn stage_upload(dir: &Path, multipart: &mut Multipart) -> ApiResult<Option<NamedTempFile>> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let suffix = upload_suffix(field.file_name());
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create staging directory: {}", e)))?;

        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

        let mut file = async_handle(&staged)
            .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

        let mut bytes = 0usize;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;
            bytes += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;

        info!(bytes, file_name = field.file_name().unwrap_or(""), "Received upload");
        return Ok(Some(staged));
    }

    Ok(None)
}

/// Async writer over the staged file; the `NamedTempFile` keeps ownership of the path
fn async_handle(staged: &NamedTempFile) -> std::io::Result<tokio::fs::File> {
    Ok(tokio::fs::File::from_std(staged.as_file().try_clone()?))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// `.ext` from the client file name, if it is a plausible extension
fn upload_suffix(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Build music analysis routes
pub fn music_routes() -> Router<AppState> {
    Router::new().route("/process-music", post(process_music))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_async_handle_writes_to_staged_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(dir.path())
            .unwrap();

        let mut file = async_handle(&staged).unwrap();
        file.write_all(b"RIFF").await.unwrap();
        file.write_all(b"....WAVE").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read(staged.path()).unwrap(), b"RIFF....WAVE");

        let path = staged.path().to_path_buf();
        staged.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_upload_suffix() {
        assert_eq!(upload_suffix(Some("song.MP3")), ".mp3");
        assert_eq!(upload_suffix(Some("my.track.flac")), ".flac");
        assert_eq!(upload_suffix(Some("noext")), "");
        assert_eq!(upload_suffix(Some("../../etc/passwd.a/b")), "");
        assert_eq!(upload_suffix(Some("weird.ex t")), "");
        assert_eq!(upload_suffix(None), "");
    }
}
