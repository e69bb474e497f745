use signage_types::SlideId;

/// Errors from inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested slide is not in the current inventory.
    #[error("slide not found: {0}")]
    NotFound(SlideId),

    /// A persisted generation is unreadable or inconsistent.
    #[error("corrupt generation {generation}: {reason}")]
    CorruptGeneration { generation: u64, reason: String },

    /// Manifest encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the backing directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for inventory operations.
pub type StoreResult<T> = Result<T, StoreError>;
