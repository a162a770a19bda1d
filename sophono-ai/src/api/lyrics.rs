//! POST /process-lyrics
//!
//! Reads the `lyrics` field from either a urlencoded or a multipart form.
//! A body that cannot be read is treated as empty lyrics.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    routing::post,
    Form, Json, Router,
};
use serde::Deserialize;
use sophono_common::api::AnalysisResponse;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::AppState;

/// Form field carrying the lyrics text
pub const LYRICS_FIELD: &str = "lyrics";

/// Form body; a missing `lyrics` field is treated as empty
#[derive(Debug, Default, Deserialize)]
pub struct LyricsForm {
    #[serde(default)]
    pub lyrics: String,
}

/// POST /process-lyrics
pub async fn process_lyrics(State(state): State<AppState>, request: Request) -> Json<AnalysisResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("process_lyrics", %request_id);

    async move {
        let lyrics = read_lyrics(request, &state).await;
        let response = state.lyrics_analyzer.process(&lyrics).await;
        state.record_outcome(&response).await;
        Json(response)
    }
    .instrument(span)
    .await
}

async fn read_lyrics(request: Request, state: &AppState) -> String {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = match Multipart::from_request(request, state).await {
            Ok(multipart) => multipart,
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "Unreadable multipart lyrics body");
                return String::new();
            }
        };
        return multipart_lyrics(&mut multipart).await;
    }

    match Form::<LyricsForm>::from_request(request, state).await {
        Ok(Form(form)) => form.lyrics,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable lyrics form body");
            String::new()
        }
    }
}

async fn multipart_lyrics(multipart: &mut Multipart) -> String {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(LYRICS_FIELD) => {
                return field.text().await.unwrap_or_else(|e| {
                    warn!(error = %e.body_text(), "Failed to read lyrics field");
                    String::new()
                });
            }
            Ok(Some(_)) => continue,
            Ok(None) => return String::new(),
            Err(e) => {
                warn!(error = %e.body_text(), "Malformed multipart lyrics body");
                return String::new();
            }
        }
    }
}

/// Build lyrics analysis routes
pub fn lyrics_routes() -> Router<AppState> {
    Router::new().route("/process-lyrics", post(process_lyrics))
}
