use std::path::{Path, PathBuf};
use std::sync::Arc;

use signage_types::{Deck, Slide, SlideId};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::ConverterConfig;
use crate::command::{OfficeConverter, PdfRasterizer};
use crate::converter::{DocumentConverter, PageRasterizer, PAGE_PREFIX};
use crate::error::{ConversionStage, RasterError, RasterResult};

const INTERMEDIATE_EXTENSION: &str = "pdf";
const PAGE_EXTENSION: &str = "png";

/// Deck to slides orchestration.
///
/// Every call gets a private scratch directory under `scratch_root`, removed
/// when the call returns. The pipeline is not internally serialized; callers
/// that share a scratch root across submissions must hold their own lock.
pub struct RasterPipeline {
    converter: Arc<dyn DocumentConverter>,
    rasterizer: Arc<dyn PageRasterizer>,
    scratch_root: PathBuf,
}

impl RasterPipeline {
    pub fn new(
        converter: Arc<dyn DocumentConverter>,
        rasterizer: Arc<dyn PageRasterizer>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            converter,
            rasterizer,
            scratch_root: scratch_root.into(),
        }
    }

    /// Pipeline driving the external programs named in `config`.
    pub fn from_config(config: &ConverterConfig, scratch_root: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(OfficeConverter::from_config(config)),
            Arc::new(PdfRasterizer::from_config(config)),
            scratch_root,
        )
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Convert `deck` into slides ordered by ordinal, 1..=N.
    pub async fn rasterize(&self, deck: &Deck) -> RasterResult<Vec<Slide>> {
        fs::create_dir_all(&self.scratch_root).await?;
        let scratch = tempfile::Builder::new()
            .prefix("convert-")
            .tempdir_in(&self.scratch_root)?;

        let input_dir = scratch.path().join("input");
        let intermediate_dir = scratch.path().join("intermediate");
        let pages_dir = scratch.path().join("pages");
        for dir in [&input_dir, &intermediate_dir, &pages_dir] {
            fs::create_dir(dir).await?;
        }

        let deck_path = input_dir.join(deck.safe_file_name());
        fs::write(&deck_path, deck.data()).await?;
        info!(
            deck = %deck.filename(),
            bytes = deck.data().len(),
            "rasterizing deck"
        );

        self.converter
            .to_intermediate(&deck_path, &intermediate_dir)
            .await?;
        let intermediate = locate_intermediate(&intermediate_dir, &deck.stem()).await?;
        debug!(path = %intermediate.display(), "intermediate located");

        let rasterized = self.rasterizer.rasterize(&intermediate, &pages_dir).await;
        if let Err(e) = fs::remove_file(&intermediate).await {
            warn!(path = %intermediate.display(), error = %e, "failed to remove intermediate");
        }
        rasterized?;

        let slides = collect_pages(&pages_dir).await?;
        info!(deck = %deck.filename(), pages = slides.len(), "deck rasterized");
        Ok(slides)
    }
}

/// Find the PDF produced for `stem` in `dir`.
///
/// The exact `<stem>.pdf` wins. Otherwise a single PDF of any name is
/// accepted; none at all means the converter produced nothing, several
/// means the output is ambiguous.
pub(crate) async fn locate_intermediate(dir: &Path, stem: &str) -> RasterResult<PathBuf> {
    let exact = dir.join(format!("{stem}.{INTERMEDIATE_EXTENSION}"));
    if fs::try_exists(&exact).await? {
        return Ok(exact);
    }

    let mut candidates = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(INTERMEDIATE_EXTENSION));
        if is_pdf && entry.file_type().await?.is_file() {
            candidates.push(path);
        }
    }

    match candidates.len() {
        0 => Err(RasterError::conversion(
            ConversionStage::ToIntermediate,
            "converter reported success but produced no PDF",
        )),
        1 => Ok(candidates.remove(0)),
        n => Err(RasterError::conversion(
            ConversionStage::IntermediateNotFound,
            format!("{stem}.{INTERMEDIATE_EXTENSION} missing and {n} other PDFs found"),
        )),
    }
}

fn page_number(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(PAGE_EXTENSION)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Read the rasterizer's `page-<n>.png` files into slides.
///
/// Page numbers must run 1..=N without gaps or duplicates.
pub(crate) async fn collect_pages(dir: &Path) -> RasterResult<Vec<Slide>> {
    let mut pages = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if let Some(n) = name.to_str().and_then(page_number) {
            pages.push((n, entry.path()));
        }
    }
    pages.sort_by_key(|(n, _)| *n);

    if pages.is_empty() {
        return Err(RasterError::conversion(
            ConversionStage::RasterOutput,
            "rasterizer produced no pages",
        ));
    }

    let mut slides = Vec::with_capacity(pages.len());
    for (expected, (n, path)) in (1u32..).zip(pages) {
        if n != expected {
            return Err(RasterError::conversion(
                ConversionStage::RasterOutput,
                format!("page sequence not contiguous: expected page {expected}, found {n}"),
            ));
        }
        let id = SlideId::from_ordinal(n)
            .map_err(|e| RasterError::conversion(ConversionStage::RasterOutput, e.to_string()))?;
        let data = fs::read(&path).await?;
        slides.push(Slide::new(id, data));
    }
    Ok(slides)
}
