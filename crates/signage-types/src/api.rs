use serde::{Deserialize, Serialize};

use crate::slide::SlideId;

/// HTTP endpoint paths shared by the distribution service and branches.
pub mod endpoints {
    pub const UPLOAD: &str = "/upload";
    pub const SLIDES: &str = "/slides";
    pub const SLIDE: &str = "/slides/:id";
    pub const RELOAD: &str = "/reload";
    pub const HEALTH: &str = "/health";
    pub const STATUS: &str = "/status";
}

/// `GET /slides` response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideListing {
    pub slides: Vec<SlideId>,
    #[serde(default)]
    pub version: u64,
}

/// Generic confirmation body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// `POST /upload` success body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub slides: usize,
    pub version: u64,
}

/// Error body returned by both services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), stage: None }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}

/// Branch `GET /status` response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStatus {
    /// Local cache generation currently displayed; 0 before the first sync.
    pub generation: u64,
    /// Inventory version the generation was pulled from.
    pub source_version: u64,
    pub slides: Vec<SlideId>,
    pub cursor: usize,
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
