use crate::platform::Platform;
use crate::snapshot::SnapshotStore;
use crate::workflow::types::FetchOutcome;

/// Fetch open pull requests and persist them to the snapshot file.
///
/// Failures are logged and reported, never propagated; on failure the
/// existing snapshot is not touched.
pub async fn fetch_open_prs(platform: &dyn Platform, snapshot: &SnapshotStore) -> FetchOutcome {
    tracing::info!("Fetching open pull requests");

    let document = match platform.list_open_pull_requests().await {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch pull requests");
            return FetchOutcome::Failed {
                error: e.to_string(),
            };
        }
    };

    let count = document["values"].as_array().map_or(0, Vec::len);

    if let Err(e) = snapshot.write(&document).await {
        tracing::error!(
            path = %snapshot.path().display(),
            error = %e,
            "Failed to write snapshot"
        );
        return FetchOutcome::Failed {
            error: e.to_string(),
        };
    }

    tracing::info!(
        count,
        path = %snapshot.path().display(),
        "Saved open pull requests"
    );
    FetchOutcome::Saved { count }
}
