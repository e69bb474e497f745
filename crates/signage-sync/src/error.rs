use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid inventory listing: {0}")]
    InvalidListing(String),

    #[error("cache generation {generation} is corrupt: {reason}")]
    CorruptCache { generation: u64, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
