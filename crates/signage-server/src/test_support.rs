//! Fakes shared by this crate's tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use signage_raster::{
    ConversionStage, DocumentConverter, PageRasterizer, RasterError, RasterPipeline, RasterResult,
    PAGE_PREFIX,
};
use signage_types::endpoints;

use crate::broadcast::{BranchNotifier, Broadcaster};
use crate::error::BroadcastError;

/// Copies the deck to `<stem>.pdf`, or fails when the deck says `fail`.
pub struct FakeOffice;

#[async_trait]
impl DocumentConverter for FakeOffice {
    async fn to_intermediate(&self, deck: &Path, out_dir: &Path) -> RasterResult<()> {
        let content = tokio::fs::read(deck).await?;
        if content.starts_with(b"fail") {
            return Err(RasterError::conversion(ConversionStage::ToIntermediate, "exit 1"));
        }
        let stem = deck.file_stem().unwrap().to_string_lossy().into_owned();
        tokio::fs::write(out_dir.join(format!("{stem}.pdf")), content).await?;
        Ok(())
    }
}

/// Reads `pages:N` and writes `page-<n>.png` containing `page <n>`.
pub struct FakeRaster;

#[async_trait]
impl PageRasterizer for FakeRaster {
    async fn rasterize(&self, intermediate: &Path, out_dir: &Path) -> RasterResult<()> {
        let text = tokio::fs::read_to_string(intermediate).await?;
        let count: u32 = text
            .trim()
            .strip_prefix("pages:")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| RasterError::conversion(ConversionStage::ToRaster, "not a pdf"))?;
        for n in 1..=count {
            tokio::fs::write(out_dir.join(format!("{PAGE_PREFIX}-{n}.png")), format!("page {n}"))
                .await?;
        }
        Ok(())
    }
}

pub fn fake_pipeline(scratch: &Path) -> RasterPipeline {
    RasterPipeline::new(Arc::new(FakeOffice), Arc::new(FakeRaster), scratch)
}

/// Counts deliveries; branches whose host is in `failing` fail.
pub struct RecordingNotifier {
    failing: HashSet<String>,
    delay: Duration,
    pub delivered: AtomicUsize,
}

impl RecordingNotifier {
    pub fn failing(hosts: &[&str]) -> Self {
        Self {
            failing: hosts.iter().map(|h| h.to_string()).collect(),
            delay: Duration::ZERO,
            delivered: AtomicUsize::new(0),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay, ..Self::failing(&[]) }
    }
}

#[async_trait]
impl BranchNotifier for RecordingNotifier {
    async fn notify(&self, branch: &Url) -> Result<(), BroadcastError> {
        tokio::time::sleep(self.delay).await;
        let host = branch.host_str().unwrap_or_default();
        if self.failing.contains(host) {
            return Err(BroadcastError::Unreachable {
                branch: branch.to_string(),
                reason: "connection refused".into(),
            });
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn recording_broadcaster(hosts: &[&str]) -> (Broadcaster, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::failing(&[]));
    let urls = hosts
        .iter()
        .map(|h| Url::parse(&format!("http://{h}:5002")).unwrap())
        .collect();
    (Broadcaster::new(notifier.clone(), urls), notifier)
}

/// A branch stand-in answering `GET /reload` and counting calls.
pub async fn spawn_branch_stub() -> (Url, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        endpoints::RELOAD,
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "ok"
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), hits)
}

/// A localhost port nothing is listening on.
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A `multipart/form-data` body with one field.
pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "signage-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
