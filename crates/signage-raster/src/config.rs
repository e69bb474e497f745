use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// External converter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Office suite binary used for the deck to PDF step.
    pub office_program: PathBuf,
    /// PDF rasterizer binary used for the PDF to PNG step.
    pub raster_program: PathBuf,
    /// Raster resolution in dots per inch.
    pub dpi: u32,
    /// Upper bound on each external invocation.
    pub timeout_secs: u64,
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            office_program: PathBuf::from("soffice"),
            raster_program: PathBuf::from("pdftoppm"),
            dpi: 150,
            timeout_secs: 120,
        }
    }
}
