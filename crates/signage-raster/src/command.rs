//! Converters backed by external programs.
//!
//! Both converters run their tool with a null stdin and captured output,
//! bounded by a timeout. The child is killed if the timeout elapses.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::ConverterConfig;
use crate::converter::{DocumentConverter, PageRasterizer, PAGE_PREFIX};
use crate::error::{ConversionStage, RasterError, RasterResult};

/// Run `program args..`, mapping every failure mode onto `stage`.
pub(crate) async fn run_tool(
    program: &Path,
    args: &[OsString],
    limit: Duration,
    stage: ConversionStage,
) -> RasterResult<()> {
    debug!(program = %program.display(), ?args, %stage, "running converter");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(RasterError::conversion(
                stage,
                format!("failed to start {}: {e}", program.display()),
            ))
        }
        Err(_) => {
            return Err(RasterError::conversion(
                stage,
                format!("{} timed out after {}s", program.display(), limit.as_secs_f32()),
            ))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RasterError::conversion(
            stage,
            format!("{} exited with {}: {}", program.display(), output.status, stderr.trim()),
        ));
    }
    Ok(())
}

/// Headless office suite converting a deck to PDF.
///
/// Invokes `<program> --headless --convert-to pdf --outdir <out_dir> <deck>`.
#[derive(Clone, Debug)]
pub struct OfficeConverter {
    program: PathBuf,
    timeout: Duration,
}

impl OfficeConverter {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.office_program.clone(), config.timeout())
    }

    fn args(deck: &Path, out_dir: &Path) -> Vec<OsString> {
        vec![
            "--headless".into(),
            "--convert-to".into(),
            "pdf".into(),
            "--outdir".into(),
            out_dir.as_os_str().to_owned(),
            deck.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl DocumentConverter for OfficeConverter {
    async fn to_intermediate(&self, deck: &Path, out_dir: &Path) -> RasterResult<()> {
        run_tool(
            &self.program,
            &Self::args(deck, out_dir),
            self.timeout,
            ConversionStage::ToIntermediate,
        )
        .await
    }
}

/// PDF rasterizer writing one PNG per page.
///
/// Invokes `<program> -png -r <dpi> <pdf> <out_dir>/page`, which produces
/// `page-1.png`, `page-2.png`, ... (zero-padded for longer documents).
#[derive(Clone, Debug)]
pub struct PdfRasterizer {
    program: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdfRasterizer {
    pub fn new(program: impl Into<PathBuf>, dpi: u32, timeout: Duration) -> Self {
        Self { program: program.into(), dpi, timeout }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.raster_program.clone(), config.dpi, config.timeout())
    }

    fn args(&self, intermediate: &Path, out_dir: &Path) -> Vec<OsString> {
        vec![
            "-png".into(),
            "-r".into(),
            self.dpi.to_string().into(),
            intermediate.as_os_str().to_owned(),
            out_dir.join(PAGE_PREFIX).into_os_string(),
        ]
    }
}

#[async_trait]
impl PageRasterizer for PdfRasterizer {
    async fn rasterize(&self, intermediate: &Path, out_dir: &Path) -> RasterResult<()> {
        run_tool(
            &self.program,
            &self.args(intermediate, out_dir),
            self.timeout,
            ConversionStage::ToRaster,
        )
        .await
    }
}
