use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;

use crate::config::BitbucketConfig;
use crate::error::{AppError, Result};
use crate::platform::Platform;

use super::auth::basic_auth_header;

pub struct BitbucketPlatform {
    client: Client,
    api_base: String,
    repo: String,
    auth_header: String,
}

impl BitbucketPlatform {
    pub fn new(config: &BitbucketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            auth_header: basic_auth_header(&config.user, &config.token),
        })
    }

    /// `{api_base}/repositories/{owner}/{slug}/pullrequests?state=OPEN`
    pub fn pull_requests_url(&self) -> String {
        let repo = self
            .repo
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/repositories/{repo}/pullrequests?state=OPEN", self.api_base)
    }
}

#[async_trait]
impl Platform for BitbucketPlatform {
    async fn list_open_pull_requests(&self) -> Result<serde_json::Value> {
        let url = self.pull_requests_url();
        tracing::debug!(url = %url, "Requesting open pull requests");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::BitbucketApi(format!(
                "API returned {status}: {body}"
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
