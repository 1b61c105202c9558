//! Test doubles for the external collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::platform::Platform;
use crate::scanner::properties::SonarProperties;
use crate::scanner::Scanner;
use crate::workspace::git::VersionControl;
use crate::workspace::WorkingTree;

/// Records git invocations and fails for configured branches.
#[derive(Default)]
pub struct MockVersionControl {
    fail_fetch: HashSet<String>,
    fail_checkout: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockVersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_fetch(mut self, branch: &str) -> Self {
        self.fail_fetch.insert(branch.to_string());
        self
    }

    pub fn fail_checkout(mut self, branch: &str) -> Self {
        self.fail_checkout.insert(branch.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionControl for MockVersionControl {
    async fn fetch_branch(&self, _tree: &WorkingTree, branch: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("fetch origin {branch}"));
        if self.fail_fetch.contains(branch) {
            return Err(AppError::VersionControl(format!(
                "couldn't find remote ref {branch}"
            )));
        }
        Ok(())
    }

    async fn checkout(&self, _tree: &WorkingTree, branch: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("checkout {branch}"));
        if self.fail_checkout.contains(branch) {
            return Err(AppError::VersionControl(format!(
                "pathspec '{branch}' did not match"
            )));
        }
        Ok(())
    }
}

/// Records the arguments of each scan; the first `fail_times` scans fail.
#[derive(Default)]
pub struct MockScanner {
    fail_remaining: AtomicUsize,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_times(self, n: usize) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn scan(&self, _tree: &WorkingTree, properties: &SonarProperties) -> Result<()> {
        self.calls.lock().unwrap().push(properties.to_args());
        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Scan("scanner exited with status 1".to_string()));
        }
        Ok(())
    }
}

/// Serves a fixed listing, or a fixed API error when `document` is `None`.
pub struct StaticPlatform {
    document: Option<serde_json::Value>,
    requests: AtomicUsize,
}

impl StaticPlatform {
    pub fn new(document: serde_json::Value) -> Self {
        Self {
            document: Some(document),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            document: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for StaticPlatform {
    async fn list_open_pull_requests(&self) -> Result<serde_json::Value> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.document.clone().ok_or_else(|| {
            AppError::BitbucketApi("API returned 503 Service Unavailable: ".to_string())
        })
    }
}

/// Never answers.
pub struct HangingPlatform;

#[async_trait]
impl Platform for HangingPlatform {
    async fn list_open_pull_requests(&self) -> Result<serde_json::Value> {
        std::future::pending().await
    }
}
