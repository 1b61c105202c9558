use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{AppError, Result};
use crate::platform::types::PullRequestSnapshot;

/// The local file holding the most recent pull request listing.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the snapshot with `document`, pretty-printed with a 4-space
    /// indent. The new contents are staged in a sibling file and renamed into
    /// place, so a failed write leaves the previous snapshot intact.
    pub async fn write(&self, document: &serde_json::Value) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document.serialize(&mut ser)?;

        let staging = self.staging_path();
        tokio::fs::write(&staging, &buf).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    /// Load the snapshot. Returns `Ok(None)` when no snapshot has been written.
    pub async fn read(&self) -> Result<Option<PullRequestSnapshot>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            AppError::Snapshot(format!("{} is not a valid snapshot: {e}", self.path.display()))
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_pretty_prints_with_four_spaces() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("prs.json"));
        store.write(&json!({"values": []})).await.unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "{\n    \"values\": []\n}");
    }

    #[tokio::test]
    async fn test_write_preserves_key_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("prs.json"));
        let doc: serde_json::Value =
            serde_json::from_str(r#"{"values": [], "pagelen": 10, "page": 1}"#).unwrap();
        store.write(&doc).await.unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let values_at = contents.find("values").unwrap();
        let page_at = contents.find("\"page\"").unwrap();
        assert!(values_at < page_at);
    }

    #[tokio::test]
    async fn test_write_truncates_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("prs.json"));
        store
            .write(&json!({"values": [{"id": 1, "source": {"branch": {"name": "a"}}}]}))
            .await
            .unwrap();
        store.write(&json!({"values": []})).await.unwrap();

        let snapshot = store.read().await.unwrap().unwrap();
        assert!(snapshot.values.is_empty());
        assert!(!tmp.path().join("prs.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path().join("prs.json"));
        assert!(!store.exists());
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_invalid_json_is_snapshot_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SnapshotStore::new(path).read().await.unwrap_err();
        assert!(matches!(err, AppError::Snapshot(_)));
    }
}
