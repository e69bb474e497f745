use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use signage_raster::RasterError;
use signage_store::StoreError;
use signage_types::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("slide not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Conversion(#[from] RasterError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id.to_string()),
            other => Self::Store(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conversion(_)
            | Self::Store(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let mut body = ErrorResponse::new(self.to_string());
        if let Self::Conversion(e) = &self {
            if let Some(stage) = e.stage() {
                body = body.with_stage(stage.as_str());
            }
        }
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A single branch could not be told to reload.
///
/// Logged by the broadcaster and never returned to an HTTP caller.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("branch {branch} unreachable: {reason}")]
    Unreachable { branch: String, reason: String },

    #[error("branch {branch} answered {status}")]
    Rejected { branch: String, status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use signage_raster::ConversionStage;
    use signage_types::SlideId;

    #[test]
    fn status_mapping() {
        assert_eq!(ServerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        let conv = ServerError::from(RasterError::conversion(ConversionStage::ToRaster, "x"));
        assert_eq!(conv.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_not_found_becomes_404() {
        let id = SlideId::from_ordinal(9).unwrap();
        let e = ServerError::from(StoreError::NotFound(id));
        assert!(matches!(&e, ServerError::NotFound(name) if name == "slide_9.png"));
    }

    #[test]
    fn broadcast_error_display() {
        let e = BroadcastError::Rejected { branch: "http://b1:5002/".into(), status: 503 };
        assert_eq!(e.to_string(), "branch http://b1:5002/ answered 503");
    }
}
