use std::path::Path;
use std::sync::Arc;

use tracing::Instrument;

use crate::error::AppError;
use crate::platform::types::PullRequestRecord;
use crate::scanner::properties::get_sonar_properties;
use crate::scanner::Scanner;
use crate::snapshot::SnapshotStore;
use crate::workflow::types::{PrOutcome, PrResult, ProcessReport};
use crate::workspace::git::VersionControl;
use crate::workspace::WorkingTree;

/// Checks out and scans every pull request in the snapshot, one at a time.
pub struct PullRequestProcessor {
    tree: WorkingTree,
    properties_file: String,
    snapshot: SnapshotStore,
    vcs: Arc<dyn VersionControl>,
    scanner: Arc<dyn Scanner>,
}

impl PullRequestProcessor {
    pub fn new(
        tree: WorkingTree,
        properties_file: &str,
        snapshot: SnapshotStore,
        vcs: Arc<dyn VersionControl>,
        scanner: Arc<dyn Scanner>,
    ) -> Self {
        Self {
            tree,
            properties_file: properties_file.to_string(),
            snapshot,
            vcs,
            scanner,
        }
    }

    pub fn tree(&self) -> &WorkingTree {
        &self.tree
    }

    /// Run one processing pass over the most recent snapshot.
    ///
    /// A missing properties file ends the whole pass; checkout and scan
    /// failures only skip the pull request they occurred on.
    pub async fn process_prs(&self) -> ProcessReport {
        tracing::info!("Processing pull requests");

        let snapshot = match self.snapshot.read().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::warn!(
                    path = %self.snapshot.path().display(),
                    "Snapshot file not found"
                );
                return ProcessReport::NoSnapshot;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load snapshot");
                return ProcessReport::InvalidSnapshot {
                    error: e.to_string(),
                };
            }
        };

        let mut results = Vec::with_capacity(snapshot.values.len());

        for pr in &snapshot.values {
            tracing::info!(
                pr = pr.id,
                branch = %pr.branch(),
                title = pr.title.as_deref().unwrap_or(""),
                "Processing pull request"
            );

            let properties_path = self.tree.join(&self.properties_file);
            tracing::debug!(path = %properties_path.display(), "Checking properties file");

            if !tokio::fs::try_exists(&properties_path).await.unwrap_or(false) {
                let err = AppError::MissingProperties(properties_path.display().to_string());
                tracing::error!(
                    pr = pr.id,
                    error = %err,
                    "Aborting processing pass"
                );
                return ProcessReport::Aborted {
                    pr_id: pr.id,
                    properties_path: properties_path.display().to_string(),
                    results,
                };
            }

            // git and scanner output is logged inside this span
            let span = tracing::info_span!("pull_request", pr = pr.id, branch = %pr.branch());
            let outcome = self
                .process_one(pr, &properties_path)
                .instrument(span)
                .await;
            match &outcome {
                PrOutcome::Scanned => {
                    tracing::info!(pr = pr.id, "Scan completed");
                }
                PrOutcome::CheckoutFailed { error } | PrOutcome::ScanFailed { error } => {
                    tracing::error!(pr = pr.id, error = %error, "Failed to process pull request");
                }
            }

            results.push(PrResult {
                id: pr.id,
                branch: pr.branch().to_string(),
                outcome,
            });
        }

        ProcessReport::Completed { results }
    }

    async fn process_one(&self, pr: &PullRequestRecord, properties_path: &Path) -> PrOutcome {
        let branch = pr.branch();

        if let Err(e) = self.vcs.fetch_branch(&self.tree, branch).await {
            return PrOutcome::CheckoutFailed {
                error: e.to_string(),
            };
        }
        if let Err(e) = self.vcs.checkout(&self.tree, branch).await {
            return PrOutcome::CheckoutFailed {
                error: e.to_string(),
            };
        }

        // Re-read on every pull request: the checked-out branch may change it.
        let properties = get_sonar_properties(properties_path).await;

        match self.scanner.scan(&self.tree, &properties).await {
            Ok(()) => PrOutcome::Scanned,
            Err(e) => PrOutcome::ScanFailed {
                error: e.to_string(),
            },
        }
    }
}
