use std::path::Path;

use async_trait::async_trait;

use crate::error::RasterResult;

/// File name prefix every [`PageRasterizer`] uses for its output pages.
///
/// Pages are written as `<out_dir>/page-<n>.png`, where `<n>` starts at 1
/// and may be zero-padded.
pub const PAGE_PREFIX: &str = "page";

/// First conversion stage: deck to intermediate PDF.
///
/// Implementations write `<out_dir>/<deck stem>.pdf`. Returning `Ok` only
/// means the tool reported success; the pipeline still checks the output.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn to_intermediate(&self, deck: &Path, out_dir: &Path) -> RasterResult<()>;
}

/// Second conversion stage: PDF to one PNG per page.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, intermediate: &Path, out_dir: &Path) -> RasterResult<()>;
}
