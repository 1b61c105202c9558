use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

/// Flat variable names accepted for compatibility with existing deployments,
/// mapped onto their config keys.
const LEGACY_VARIABLES: &[(&str, &str)] = &[
    ("BITBUCKET_REPO", "bitbucket.repo"),
    ("BITBUCKET_USER", "bitbucket.user"),
    ("BITBUCKET_TOKEN", "bitbucket.token"),
    ("SONAR_SCANNER", "scanner.command"),
    ("SONAR_PROJECT_PROPERTIES", "scanner.properties_file"),
    ("POLL_INTERVAL", "poll.interval_secs"),
    ("PROJECT_PATH", "workspace.project_path"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bitbucket: BitbucketConfig,
    pub scanner: ScannerConfig,
    pub poll: PollConfig,
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Deserialize, Clone)]
pub struct BitbucketConfig {
    /// Repository identifier in `owner/slug` form.
    pub repo: String,
    pub user: String,
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for BitbucketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitbucketConfig")
            .field("repo", &self.repo)
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Executable or command line used to run the analysis.
    pub command: String,
    /// Properties file name, relative to the project path.
    pub properties_file: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    pub interval_secs: u64,
    #[serde(default = "default_max_cycle")]
    pub max_cycle_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    pub project_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    /// Address for the read-only health endpoint. Disabled when unset.
    pub health_addr: Option<String>,
}

fn default_api_base() -> String {
    "https://api.bitbucket.org/2.0".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    30 * 60
}

fn default_max_cycle() -> u64 {
    2 * 60 * 60
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("prs.json")
}

impl AppConfig {
    /// Load configuration from an optional file, the process environment and
    /// a `.env` file in the working directory. Real environment variables take
    /// precedence over `.env` entries.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let env = merge_env(Path::new(".env"), std::env::vars());
        Self::load_from(config_path, env)
    }

    /// Build the configuration from an explicit variable set.
    pub fn load_from(config_path: Option<&str>, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("sonarpoll").required(false));
        }

        // SONARPOLL_<SECTION>__<KEY>
        let prefixed: config::Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        builder = builder.add_source(
            config::Environment::with_prefix("SONARPOLL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(prefixed)),
        );

        for (variable, key) in LEGACY_VARIABLES {
            let value = env.get(*variable).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("bitbucket.repo", self.bitbucket.repo.as_str()),
            ("bitbucket.user", self.bitbucket.user.as_str()),
            ("bitbucket.token", self.bitbucket.token.as_str()),
            ("scanner.command", self.scanner.command.as_str()),
            ("scanner.properties_file", self.scanner.properties_file.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{key} must not be empty")));
            }
        }

        if self.workspace.project_path.as_os_str().is_empty() {
            return Err(AppError::Config(
                "workspace.project_path must not be empty".to_string(),
            ));
        }

        match self.bitbucket.repo.split_once('/') {
            Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() && !slug.contains('/') => {}
            _ => {
                return Err(AppError::Config(format!(
                    "bitbucket.repo must be in owner/slug form, got: {}",
                    self.bitbucket.repo
                )));
            }
        }

        if self.poll.interval_secs == 0 {
            return Err(AppError::Config(
                "poll.interval_secs must be a positive integer".to_string(),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn max_cycle(&self) -> Duration {
        Duration::from_secs(self.poll.max_cycle_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.scanner.command_timeout_secs)
    }

    /// Full path of the scanner properties file inside the project.
    pub fn properties_path(&self) -> PathBuf {
        self.workspace.project_path.join(&self.scanner.properties_file)
    }
}

/// Overlay `vars` on the entries of the dotenv file at `dotenv_path`, so
/// variables already set in the environment win.
fn merge_env(
    dotenv_path: &Path,
    vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let mut env = read_dotenv(dotenv_path);
    env.extend(vars);
    env
}

/// Read variables from a dotenv file. A missing file yields nothing; a
/// malformed one is logged and skipped from the first bad line on.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open dotenv file");
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse dotenv file");
                break;
            }
        }
    }
    vars
}
