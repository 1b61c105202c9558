use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sonarpoll::config::AppConfig;
use sonarpoll::platform::bitbucket::BitbucketPlatform;
use sonarpoll::poll::PollLoop;
use sonarpoll::scanner::ShellScanner;
use sonarpoll::server::{serve, AppState};
use sonarpoll::shutdown::cancel_on_signal;
use sonarpoll::snapshot::SnapshotStore;
use sonarpoll::workflow::process::PullRequestProcessor;
use sonarpoll::workspace::git::GitCli;
use sonarpoll::workspace::WorkingTree;

#[derive(Parser)]
#[command(
    name = "sonarpoll",
    about = "Runs the SonarQube scanner on every open Bitbucket pull request"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(cli.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!(
        repo = %config.bitbucket.repo,
        project = %config.workspace.project_path.display(),
        properties = %config.properties_path().display(),
        interval_secs = config.poll.interval_secs,
        "Starting sonarpoll"
    );

    let tree = WorkingTree::open(&config.workspace.project_path)?;
    let platform = Arc::new(BitbucketPlatform::new(&config.bitbucket)?);
    let snapshot = SnapshotStore::new(&config.snapshot.path);

    let processor = PullRequestProcessor::new(
        tree,
        &config.scanner.properties_file,
        snapshot.clone(),
        Arc::new(GitCli::new(config.command_timeout())),
        Arc::new(ShellScanner::new(
            &config.scanner.command,
            config.command_timeout(),
        )),
    );

    let poll = PollLoop::new(
        platform,
        snapshot,
        processor,
        config.poll_interval(),
        config.max_cycle(),
    );

    if cli.once {
        let report = poll.run_cycle().await;
        tracing::info!(report = ?report, "Single cycle complete");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    if let Some(addr) = config.server.health_addr.clone() {
        let state = Arc::new(AppState::new(poll.status()));
        let token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = serve(&addr, state, token).await {
                tracing::error!(error = %e, "Health endpoint failed");
            }
        });
    }

    poll.run(shutdown).await;

    Ok(())
}
