//! survey-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SURVEY_*` environment variables, picks the response backend, and serves
//! the JSON API over HTTP.
//!
//! ```text
//! SURVEY_PORT=8080 SURVEY_SHEETS__SPREADSHEET_ID=... \
//!   SURVEY_SHEETS__CREDENTIALS_PATH=key.json \
//!   cargo run -p survey-server --bin server
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use survey_server::{AppState, Backend, ServerConfig, config::select_backend};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Song-version survey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SURVEY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let backend = select_backend(&server_cfg);
  if let Backend::Remote(store) = &backend {
    match store.ensure_header().await {
      Ok(true) => {}
      Ok(false) => tracing::debug!("responses sheet already has a header"),
      Err(e) => tracing::warn!(error = %e, "could not check the responses sheet header"),
    }
  }

  let state = AppState::new(backend, &server_cfg);
  let app = survey_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
