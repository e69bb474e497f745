use std::fmt;

use thiserror::Error;

/// The pipeline step a conversion failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionStage {
    /// Deck to intermediate PDF.
    ToIntermediate,
    /// The converter succeeded but no usable PDF could be located.
    IntermediateNotFound,
    /// PDF to per-page images.
    ToRaster,
    /// The raster step produced no pages or a non-contiguous page sequence.
    RasterOutput,
}

impl ConversionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToIntermediate => "to-intermediate",
            Self::IntermediateNotFound => "intermediate-not-found",
            Self::ToRaster => "to-raster",
            Self::RasterOutput => "raster-output",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("conversion failed at {stage}: {detail}")]
    Conversion { stage: ConversionStage, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    pub fn conversion(stage: ConversionStage, detail: impl Into<String>) -> Self {
        Self::Conversion { stage, detail: detail.into() }
    }

    /// The failing stage, if this is a conversion failure.
    pub fn stage(&self) -> Option<ConversionStage> {
        match self {
            Self::Conversion { stage, .. } => Some(*stage),
            Self::Io(_) => None,
        }
    }
}

pub type RasterResult<T> = Result<T, RasterError>;
