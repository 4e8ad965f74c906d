//! gatepass server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # Bootstrapping accounts
//!
//! ```
//! cargo run -p gatepass-server -- add-user gate@hostel.edu "Main Gate" WATCHMAN
//! cargo run -p gatepass-server -- hash-password
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration as StdDuration};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use gatepass_api::{ApiState, auth::hash_password};
use gatepass_core::{
  principal::{Gender, Role},
  store::{HostelStore, NewUser},
};
use gatepass_server::ServerConfig;
use gatepass_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const PURGE_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);

#[derive(Parser)]
#[command(author, version, about = "Gatepass hostel server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,

  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,

  /// Create an account; the password is read from stdin.
  AddUser {
    email: String,
    name:  String,
    /// STUDENT, ADMIN, WARDEN, WATCHMAN or SUPER.
    role:  String,
    /// MALE or FEMALE.
    #[arg(long)]
    gender: Option<String>,
  },
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      let hash = hash_password(&password)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      println!("{hash}");
      Ok(())
    }
    Command::AddUser { email, name, role, gender } => {
      let cfg = ServerConfig::load(&cli.config)?;
      let store = open_store(&cfg).await?;

      let role = Role::parse(&role.to_uppercase())?;
      let gender = gender
        .map(|g| Gender::parse(&g.to_uppercase()))
        .transpose()?;
      let password = read_password()?;
      anyhow::ensure!(!password.is_empty(), "password must not be empty");
      let password_hash = hash_password(&password)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

      let user = store
        .add_user(NewUser { email, name, role, gender, password_hash })
        .await
        .context("failed to add user")?;
      println!("created {} ({}) with id {}", user.email, user.role, user.id);
      Ok(())
    }
    Command::Serve => serve(ServerConfig::load(&cli.config)?).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = Arc::new(open_store(&cfg).await?);

  let purger = Arc::clone(&store);
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(PURGE_INTERVAL);
    loop {
      tick.tick().await;
      if let Err(e) = purger.purge_expired_sessions(Utc::now()).await {
        tracing::warn!(error = %e, "session purge failed");
      }
    }
  });

  let app = gatepass_server::app(ApiState::new(store, cfg.session_ttl()));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = cfg.resolved_store_path();
  if let Some(dir) = store_path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {}", dir.display()))?;
  }
  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

/// Read one password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
