//! docket server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) overlaid with
//! `DOCKET_*` environment variables, opens the SQLite store and blob
//! directory, and serves the JSON API over HTTP.
//!
//! Nested keys use a double underscore, e.g. `DOCKET_ASSIST__API_KEY`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use docket_api::{AppState, ServerConfig, assist::GenerativeClient, otp::LogOtpSender};
use docket_core::blob::FsBlobStore;
use docket_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Docket document server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("DOCKET")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let database_path = expand_tilde(&server_cfg.database_path);
  let upload_dir = expand_tilde(&server_cfg.upload_dir);

  let blobs = FsBlobStore::open(&upload_dir)
    .with_context(|| format!("failed to open upload directory {upload_dir:?}"))?;
  let store = SqliteStore::open(&database_path, blobs)
    .await
    .with_context(|| format!("failed to open store at {database_path:?}"))?;

  let assist = match &server_cfg.assist {
    Some(cfg) => {
      let client = GenerativeClient::new(cfg).context("failed to build assist client")?;
      tracing::info!(endpoint = %cfg.endpoint, "assist enabled");
      Some(Arc::new(client))
    }
    None => {
      tracing::info!("assist disabled: no [assist] section configured");
      None
    }
  };

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState {
    store: Arc::new(store),
    config: Arc::new(server_cfg),
    otp: Arc::new(LogOtpSender),
    assist,
  };

  let app = docket_api::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
