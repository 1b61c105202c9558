use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::poll::SharedStatus;
use crate::workflow::types::CycleReport;

pub struct AppState {
    pub status: SharedStatus,
}

impl AppState {
    pub fn new(status: SharedStatus) -> Self {
        Self { status }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(last_cycle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the read-only health endpoint until `shutdown` is cancelled.
pub async fn serve(addr: &str, state: Arc<AppState>, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Health endpoint listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}

async fn last_cycle(State(state): State<Arc<AppState>>) -> Json<Option<CycleReport>> {
    Json(state.status.read().await.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{FetchOutcome, ProcessReport};
    use chrono::Utc;
    use tokio::sync::RwLock;

    async fn spawn_server(status: SharedStatus) -> (String, CancellationToken) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let app = create_router(Arc::new(AppState::new(status)));
        let shutdown = token.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .unwrap();
        });
        (format!("http://{addr}"), token)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (base, token) = spawn_server(Arc::new(RwLock::new(None))).await;
        let body = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
        token.cancel();
    }

    #[tokio::test]
    async fn test_status_before_first_cycle_is_null() {
        let (base, token) = spawn_server(Arc::new(RwLock::new(None))).await;
        let body: serde_json::Value = reqwest::get(format!("{base}/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body.is_null());
        token.cancel();
    }

    #[tokio::test]
    async fn test_status_reports_last_cycle() {
        let report = CycleReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            fetch: Some(FetchOutcome::Saved { count: 3 }),
            process: Some(ProcessReport::NoSnapshot),
            timed_out: false,
        };
        let (base, token) = spawn_server(Arc::new(RwLock::new(Some(report)))).await;
        let body: serde_json::Value = reqwest::get(format!("{base}/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["fetch"]["result"], "saved");
        assert_eq!(body["fetch"]["count"], 3);
        assert_eq!(body["process"]["result"], "no_snapshot");
        token.cancel();
    }
}
