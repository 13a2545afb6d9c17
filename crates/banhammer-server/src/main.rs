//! banhammer server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `BANHAMMER_*` environment variables, loads the heuristics file, and serves
//! the VK Callback API endpoint over HTTP.
//!
//! # Checking a heuristics file
//!
//! ```
//! cargo run -p banhammer-server --bin banhammer -- --check
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use banhammer_core::engine::Engine;
use banhammer_server::{AppState, ServerConfig, heuristics};
use banhammer_vk::VkClient;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "VK wall comment moderation webhook")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "BANHAMMER_CONFIG")]
  config: PathBuf,

  /// Validate the heuristics file, print the loaded rules and exit.
  #[arg(long)]
  check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BANHAMMER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate()?;

  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(server_cfg.log_level()?.into())
        .from_env_lossy(),
    )
    .init();

  let rules = heuristics::load_rules(&server_cfg.heuristics_path)
    .with_context(|| format!("failed to load heuristic rules from {:?}", server_cfg.heuristics_path))?;
  tracing::info!(rules = rules.len(), "heuristic rules loaded");

  // Helper mode: report the rules and exit.
  if cli.check {
    println!("{rules:#?}");
    return Ok(());
  }

  let client = VkClient::new(server_cfg.vk_config()).context("failed to build VK client")?;
  let engine = Engine::with_cache_capacity(client, rules, server_cfg.cache_capacity);

  let state = AppState {
    engine: Arc::new(engine),
    config: Arc::new(server_cfg.clone()),
  };

  let app = banhammer_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => {},
    () = terminate => {},
  }
  tracing::info!("shutdown signal received");
}
