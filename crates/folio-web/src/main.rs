//! folio server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under the
//! process environment, opens the SQLite store under `data_dir`, and serves
//! the site over HTTP.
//!
//! # Password hash generation
//!
//! To generate an argon2 PHC string for `ADMIN_PASSWORD_HASH` or
//! `SITE_PASSWORD_HASH`:
//!
//! ```text
//! cargo run -p folio-web --bin folio -- --hash-password
//! ```

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use folio_store_sqlite::SqliteStore;
use folio_web::{AppState, ServerConfig};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Portfolio site and admin CMS")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    if password.is_empty() {
      anyhow::bail!("empty password");
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::default().try_parsing(true))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.admin_hash().is_none() {
    tracing::warn!("ADMIN_PASSWORD_HASH is not set; admin login is disabled");
  }
  if server_cfg.production && server_cfg.uses_default_secret() {
    tracing::warn!("SESSION_SECRET is the development default; set it in production");
  }
  if server_cfg.site_gated() {
    tracing::info!("viewer gate enabled");
  }

  for dir in [&server_cfg.data_dir, &server_cfg.uploads_dir] {
    tokio::fs::create_dir_all(dir)
      .await
      .with_context(|| format!("failed to create {dir:?}"))?;
  }

  let store_path = server_cfg.database_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, server_cfg);
  let app = folio_web::router(state).layer(TraceLayer::new_for_http());

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Read one line from stdin, without its line ending.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}
