use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one fetch step.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Listing written to the snapshot file.
    Saved { count: usize },
    /// Nothing written; the previous snapshot (if any) is left as it was.
    Failed { error: String },
}

/// Result of processing a single pull request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PrOutcome {
    Scanned,
    CheckoutFailed { error: String },
    ScanFailed { error: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrResult {
    pub id: u64,
    pub branch: String,
    #[serde(flatten)]
    pub outcome: PrOutcome,
}

/// Result of one processing pass over the snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProcessReport {
    /// No snapshot file exists yet.
    NoSnapshot,
    /// The snapshot could not be read or parsed.
    InvalidSnapshot { error: String },
    /// Every pull request in the snapshot was attempted.
    Completed { results: Vec<PrResult> },
    /// The properties file was missing; remaining pull requests were skipped.
    Aborted {
        pr_id: u64,
        properties_path: String,
        results: Vec<PrResult>,
    },
}

impl ProcessReport {
    pub fn results(&self) -> &[PrResult] {
        match self {
            ProcessReport::Completed { results } | ProcessReport::Aborted { results, .. } => {
                results
            }
            ProcessReport::NoSnapshot | ProcessReport::InvalidSnapshot { .. } => &[],
        }
    }
}

/// Summary of one full poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetch: Option<FetchOutcome>,
    pub process: Option<ProcessReport>,
    /// The cycle was cut short by the maximum cycle duration.
    pub timed_out: bool,
}
