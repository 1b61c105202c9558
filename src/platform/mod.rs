pub mod bitbucket;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch the current listing of open pull requests as the raw JSON
    /// document returned by the hosting API.
    async fn list_open_pull_requests(&self) -> Result<serde_json::Value>;
}
