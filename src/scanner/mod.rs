pub mod properties;

use std::time::Duration;

use async_trait::async_trait;

use crate::command;
use crate::error::{AppError, Result};
use crate::workspace::WorkingTree;
use properties::SonarProperties;

/// Runs static analysis against the checked-out working tree.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, tree: &WorkingTree, properties: &SonarProperties) -> Result<()>;
}

/// Invokes the configured scanner command through the shell.
pub struct ShellScanner {
    command: String,
    timeout: Duration,
}

impl ShellScanner {
    pub fn new(command: &str, timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            timeout,
        }
    }
}

/// Compose `<scanner> -Dk=v -Dk=v ...` as a single shell command line.
pub fn build_scan_command(scanner: &str, properties: &SonarProperties) -> String {
    let mut parts = vec![scanner.to_string()];
    parts.extend(properties.to_args());
    parts.join(" ")
}

#[async_trait]
impl Scanner for ShellScanner {
    async fn scan(&self, tree: &WorkingTree, properties: &SonarProperties) -> Result<()> {
        let command_line = build_scan_command(&self.command, properties);
        tracing::info!(
            scanner = %self.command,
            properties = properties.len(),
            "Running scanner"
        );

        let output = command::run_shell(&command_line, tree.path(), self.timeout).await?;
        if !output.success {
            return Err(AppError::Scan(format!(
                "scanner exited with status {}: {}",
                output.exit_code,
                output.summary()
            )));
        }
        Ok(())
    }
}
