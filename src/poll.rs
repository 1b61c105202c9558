use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::platform::Platform;
use crate::snapshot::SnapshotStore;
use crate::workflow::fetch::fetch_open_prs;
use crate::workflow::process::PullRequestProcessor;
use crate::workflow::types::CycleReport;

/// Most recent cycle report, shared with the health endpoint.
pub type SharedStatus = Arc<RwLock<Option<CycleReport>>>;

/// Sequential fetch → process → sleep driver.
pub struct PollLoop {
    platform: Arc<dyn Platform>,
    snapshot: SnapshotStore,
    processor: PullRequestProcessor,
    interval: Duration,
    max_cycle: Duration,
    status: SharedStatus,
}

impl PollLoop {
    pub fn new(
        platform: Arc<dyn Platform>,
        snapshot: SnapshotStore,
        processor: PullRequestProcessor,
        interval: Duration,
        max_cycle: Duration,
    ) -> Self {
        Self {
            platform,
            snapshot,
            processor,
            interval,
            max_cycle,
            status: Arc::new(RwLock::new(None)),
        }
    }

    pub fn status(&self) -> SharedStatus {
        Arc::clone(&self.status)
    }

    /// Run exactly one fetch + process cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let mut fetch = None;
        let mut process = None;

        let work = async {
            fetch = Some(fetch_open_prs(self.platform.as_ref(), &self.snapshot).await);
            process = Some(self.processor.process_prs().await);
        };
        let timed_out = tokio::time::timeout(self.max_cycle, work).await.is_err();
        if timed_out {
            tracing::warn!(
                max_cycle_secs = self.max_cycle.as_secs(),
                "Poll cycle exceeded its maximum duration and was abandoned"
            );
        }

        self.log_checked_out_branch().await;

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            fetch,
            process,
            timed_out,
        };
        *self.status.write().await = Some(report.clone());
        report
    }

    /// Poll until `shutdown` is cancelled. Cancellation is observed between
    /// cycles and while sleeping; a running cycle is allowed to finish.
    /// Returns the number of cycles run.
    pub async fn run(&self, shutdown: CancellationToken) -> usize {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Entering poll loop"
        );

        let mut cycles = 0;
        while !shutdown.is_cancelled() {
            tracing::info!(cycle = cycles + 1, "Starting poll cycle");
            let report = self.run_cycle().await;
            cycles += 1;
            tracing::debug!(report = ?report, "Poll cycle finished");

            tracing::info!("Waiting for the next poll");
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        tracing::info!(cycles, "Poll loop stopped");
        cycles
    }

    async fn log_checked_out_branch(&self) {
        let tree = self.processor.tree().clone();
        match tokio::task::spawn_blocking(move || tree.current_branch()).await {
            Ok(Ok(Some(branch))) => {
                tracing::info!(branch = %branch, "Working tree left on branch");
            }
            Ok(Ok(None)) => tracing::info!("Working tree has a detached HEAD"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Could not inspect working tree"),
            Err(e) => tracing::warn!(error = %e, "Working tree inspection task panicked"),
        }
    }
}
