use std::time::Duration;

use async_trait::async_trait;

use crate::command;
use crate::error::{AppError, Result};
use crate::workspace::WorkingTree;

/// Branch operations against the working tree.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// `fetch origin <branch>`
    async fn fetch_branch(&self, tree: &WorkingTree, branch: &str) -> Result<()>;

    /// `checkout <branch>`
    async fn checkout(&self, tree: &WorkingTree, branch: &str) -> Result<()>;
}

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::VersionControl("Empty branch name".to_string()));
    }
    if name.starts_with('-') {
        return Err(AppError::VersionControl(format!(
            "Invalid branch name (starts with '-'): {name}"
        )));
    }
    Ok(())
}

/// Drives the `git` command-line tool, relying on whatever credentials the
/// working tree's remote is configured with.
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn git(&self, tree: &WorkingTree, args: &[&str]) -> Result<()> {
        let output = command::run("git", args, tree.path(), self.timeout)
            .await
            .map_err(|e| AppError::VersionControl(format!("git {}: {e}", args.join(" "))))?;

        if !output.success {
            return Err(AppError::VersionControl(format!(
                "git {} exited with status {}: {}",
                args.join(" "),
                output.exit_code,
                output.summary()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn fetch_branch(&self, tree: &WorkingTree, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.git(tree, &["fetch", "origin", branch]).await
    }

    async fn checkout(&self, tree: &WorkingTree, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.git(tree, &["checkout", branch]).await
    }
}
