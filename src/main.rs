//! Entry point: parse arguments, initialize logging, and either wrap a
//! shell or fetch one history entry from an already-running session.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};

use betterhist::config::ClientConfig;
use betterhist::{client, config, render_md, session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging goes to stderr, never stdout: stdout is the proxied
    // terminal stream a wrapped shell's user is watching live.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Some(Commands::Get { index }) => {
            let config = ClientConfig::from_env()?;
            run_get(&config, index).await?;
            0
        }
        None => run_default().await?,
    };

    std::process::exit(exit_code);
}

/// No subcommand given: either wrap a fresh shell, or — if we're already
/// nested inside a wrapped session — just print the most recent entry.
/// Nested invocations are detected by `BETTERHIST_SERVER` already being
/// set in the environment.
async fn run_default() -> anyhow::Result<i32> {
    if let Ok(config) = ClientConfig::from_env() {
        run_get(&config, -1).await?;
        return Ok(0);
    }

    let session_config = session::SessionConfig {
        name: betterhist::DEFAULT_LIST_NAME.to_string(),
        shell_path: config::shell_to_spawn(),
    };
    session::run(session_config).await
}

async fn run_get(config: &ClientConfig, index: i64) -> anyhow::Result<()> {
    let snapshot = client::fetch_snapshot(config, betterhist::DEFAULT_LIST_NAME, index).await?;
    println!("{}", render_md::format_snapshot_markdown(&snapshot.user_view, &snapshot.command_view));
    Ok(())
}
