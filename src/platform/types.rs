use serde::{Deserialize, Serialize};

/// The persisted listing of open pull requests, as returned by the API.
/// Only the fields the processor needs are modelled; everything else in
/// the document is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    #[serde(default)]
    pub values: Vec<PullRequestRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    pub source: PullRequestSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSource {
    pub branch: BranchRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
}

impl PullRequestRecord {
    pub fn branch(&self) -> &str {
        &self.source.branch.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ignores_extra_fields() {
        let json = r#"{
            "pagelen": 10,
            "values": [
                {
                    "id": 7,
                    "title": "Add widgets",
                    "state": "OPEN",
                    "source": {"branch": {"name": "feature/widgets"}, "commit": {"hash": "abc"}},
                    "destination": {"branch": {"name": "main"}}
                }
            ]
        }"#;
        let snapshot: PullRequestSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.values.len(), 1);
        assert_eq!(snapshot.values[0].id, 7);
        assert_eq!(snapshot.values[0].branch(), "feature/widgets");
        assert_eq!(snapshot.values[0].title.as_deref(), Some("Add widgets"));
    }

    #[test]
    fn test_record_without_title() {
        let json = r#"{"values": [{"id": 3, "source": {"branch": {"name": "fix"}}}]}"#;
        let snapshot: PullRequestSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.values[0].title.is_none());
    }

    #[test]
    fn test_snapshot_without_values_is_empty() {
        let snapshot: PullRequestSnapshot = serde_json::from_str(r#"{"size": 0}"#).unwrap();
        assert!(snapshot.values.is_empty());
    }

    #[test]
    fn test_record_without_branch_is_rejected() {
        let json = r#"{"values": [{"id": 1, "source": {}}]}"#;
        assert!(serde_json::from_str::<PullRequestSnapshot>(json).is_err());
    }
}
