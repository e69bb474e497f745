use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use signage_types::{
    Deck, HealthResponse, MessageResponse, SlideId, SlideListing, UploadResponse,
};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::service::DistributionService;

const UPLOAD_FIELD: &str = "file";

pub type AppState = Arc<DistributionService>;

/// `POST /upload`: rasterize and publish the deck in the `file` field.
pub async fn upload_handler(
    State(service): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "ignoring multipart field");
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("failed to read upload: {e}")))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| ServerError::BadRequest("No file uploaded".into()))?;
    if filename.is_empty() {
        return Err(ServerError::BadRequest("No selected file".into()));
    }

    let outcome = service.submit(Deck::new(filename, data)).await?;
    Ok(Json(UploadResponse {
        message: "Slides uploaded and processed successfully".into(),
        slides: outcome.slides,
        version: outcome.version,
    }))
}

/// `GET /slides`: identifiers in ordinal order.
pub async fn list_handler(State(service): State<AppState>) -> Json<SlideListing> {
    let snapshot = service.list();
    Json(SlideListing {
        slides: snapshot.ids(),
        version: snapshot.version(),
    })
}

/// `GET /slides/:id`: raw PNG bytes.
pub async fn fetch_handler(
    State(service): State<AppState>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    let id: SlideId = name
        .parse()
        .map_err(|_| ServerError::NotFound(name.clone()))?;
    let slide = service.fetch(&id)?;
    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (header::ETAG, format!("\"{}\"", slide.digest())),
    ];
    Ok((headers, slide.data().clone()).into_response())
}

/// `GET /reload`: broadcast a reload to every branch without waiting.
pub async fn reload_handler(State(service): State<AppState>) -> Json<MessageResponse> {
    let branches = service.branch_count();
    drop(service.reload());
    Json(MessageResponse::new(format!("Reload signal sent to {branches} branches")))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
