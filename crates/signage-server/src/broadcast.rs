//! Best-effort reload fan-out to the branch registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use signage_types::endpoints;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::error::{BroadcastError, ServerError, ServerResult};

/// Delivers one reload signal to one branch.
#[async_trait]
pub trait BranchNotifier: Send + Sync {
    async fn notify(&self, branch: &Url) -> Result<(), BroadcastError>;
}

/// Calls `GET <branch>/reload` with a bounded timeout. No retries.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> ServerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BranchNotifier for HttpNotifier {
    async fn notify(&self, branch: &Url) -> Result<(), BroadcastError> {
        let url = branch.join(endpoints::RELOAD).map_err(|e| BroadcastError::Unreachable {
            branch: branch.to_string(),
            reason: e.to_string(),
        })?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BroadcastError::Unreachable {
                branch: branch.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(BroadcastError::Rejected {
                branch: branch.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Per-branch outcome of one broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

/// Fans a reload signal out to every registered branch.
#[derive(Clone)]
pub struct Broadcaster {
    notifier: Arc<dyn BranchNotifier>,
    branches: Arc<[Url]>,
}

impl Broadcaster {
    pub fn new(notifier: Arc<dyn BranchNotifier>, branches: Vec<Url>) -> Self {
        Self { notifier, branches: branches.into() }
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Start notifying every branch and return immediately.
    ///
    /// Notifications run concurrently on the tokio runtime. Dropping the
    /// returned handle detaches the broadcast; awaiting it yields the report.
    /// Per-branch failures are logged here and never propagated.
    pub fn broadcast(&self) -> JoinHandle<BroadcastReport> {
        let notifier = Arc::clone(&self.notifier);
        let branches = Arc::clone(&self.branches);

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();
            for branch in branches.iter().cloned() {
                let notifier = Arc::clone(&notifier);
                tasks.spawn(async move {
                    let outcome = notifier.notify(&branch).await;
                    (branch, outcome)
                });
            }

            let mut report = BroadcastReport::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((branch, Ok(()))) => {
                        debug!(%branch, "reload delivered");
                        report.delivered.push(branch.to_string());
                    }
                    Ok((branch, Err(e))) => {
                        warn!(%branch, error = %e, "reload notification failed");
                        report.failed.push(branch.to_string());
                    }
                    Err(e) => warn!(error = %e, "reload notification task aborted"),
                }
            }

            info!(
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "broadcast finished"
            );
            report
        })
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("branches", &self.branches)
            .finish_non_exhaustive()
    }
}
