//! `gatepass`: command-line client for the gate-pass service.
//!
//! # Usage
//!
//! ```
//! gatepass --url http://localhost:3000 signin gate@hostel.edu
//! gatepass list --email john --from 2025-03-01
//! gatepass out 12
//! gatepass scan john@hostel.edu --return
//! ```

mod client;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use gatepass_core::{
  filter::{SubmissionFilter, parse_date_bound},
  gate::{GateOutcome, PrincipalLoad, RoleGate},
  panel::{Notice, WatchPanel},
  signin::Credentials,
  submission::ReturnVia,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gatepass", about = "Command-line client for the hostel gate")]
struct Args {
  /// Path to a TOML config file (url, token_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the gatepass server (default: http://localhost:3000).
  #[arg(long, env = "GATEPASS_URL")]
  url: Option<String>,

  /// Session token; overrides the one saved by `signin`.
  #[arg(long, env = "GATEPASS_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and remember the session token.
  Signin {
    email: String,
    /// Read from stdin when omitted.
    #[arg(long, env = "GATEPASS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// End the current session.
  Signout,
  /// Show the signed-in user.
  Whoami,
  /// Request a gate pass (students).
  Apply {
    #[arg(long, default_value = "")]
    photo: String,
    /// Save without submitting.
    #[arg(long)]
    draft: bool,
  },
  /// List active passes.
  List {
    /// Case-insensitive substring of the student's email.
    #[arg(long)]
    email: Option<String>,
    /// Earliest out-time, RFC 3339 or YYYY-MM-DD (midnight UTC).
    #[arg(long)]
    from: Option<String>,
    /// Latest out-time, RFC 3339 or YYYY-MM-DD (midnight UTC).
    #[arg(long)]
    to: Option<String>,
  },
  /// Mark a student as gone out.
  Out { id: i64 },
  /// Mark a student as returned.
  Return { id: i64 },
  /// Look up a scanned QR payload.
  Scan {
    code: String,
    /// Record the return immediately, even without a prior out.
    #[arg(long = "return")]
    mark_return: bool,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  token_file: Option<PathBuf>,
}

fn default_token_file() -> PathBuf {
  let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
  PathBuf::from(home).join(".config/gatepass/token")
}

fn read_token(path: &Path) -> Option<String> {
  let raw = std::fs::read_to_string(path).ok()?;
  let token = raw.trim();
  (!token.is_empty()).then(|| token.to_owned())
}

fn write_token(path: &Path, token: &str) -> Result<()> {
  if let Some(dir) = path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("creating {}", dir.display()))?;
  }
  std::fs::write(path, token).with_context(|| format!("writing {}", path.display()))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };
  let token_file = file_cfg.token_file.clone().unwrap_or_else(default_token_file);

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    token:    args.token.or_else(|| read_token(&token_file)),
  };
  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Signin { email, password } => {
      let password = match password {
        Some(p) => p,
        None => read_password()?,
      };
      let creds = Credentials::new(email, password);
      // Blank fields never reach the server.
      if let Err(e) = creds.validate() {
        bail!("{e}");
      }
      let signed = match client.signin(&creds).await {
        Ok(s) => s,
        Err(e) if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED) => {
          bail!("Invalid credentials")
        }
        Err(e) => return Err(e).context("sign-in failed"),
      };
      write_token(&token_file, &signed.token)?;
      println!(
        "signed in as {} ({}); home is {}",
        signed.user.email, signed.user.role, signed.redirect
      );
    }
    Command::Signout => {
      client.signout().await.context("sign-out failed")?;
      if token_file.exists() {
        std::fs::remove_file(&token_file)
          .with_context(|| format!("removing {}", token_file.display()))?;
      }
      println!("signed out");
    }
    Command::Whoami => match client.session().await?.user {
      Some(user) => println!("{}", output::principal_line(&user)),
      None => println!("not signed in"),
    },
    Command::Apply { photo, draft } => {
      let pass = client.create_pass(&photo, !draft).await?;
      println!("{}", output::header());
      println!("{}", output::row(&pass));
    }
    Command::List { email, from, to } => {
      let filter = SubmissionFilter {
        email,
        from: from.as_deref().map(parse_date_bound).transpose()?,
        to: to.as_deref().map(parse_date_bound).transpose()?,
      };
      let panel = open_panel(client).await?;
      let visible = panel.visible(&filter);
      println!("{}", output::header());
      for pass in &visible {
        println!("{}", output::row(pass));
      }
      println!("{} of {} active", visible.len(), panel.tracker().active().len());
    }
    Command::Out { id } => {
      let mut panel = open_panel(client).await?;
      report(panel.mark_out(id).await)?;
    }
    Command::Return { id } => {
      let mut panel = open_panel(client).await?;
      report(panel.mark_return(id, ReturnVia::List).await)?;
    }
    Command::Scan { code, mark_return } => {
      let mut panel = open_panel(client).await?;
      let (found, photo) = match panel.scan(&code) {
        Ok(pass) => (output::row(pass), output::photo_line(pass)),
        Err(notice) => return report(notice),
      };
      println!("{}", output::header());
      println!("{found}");
      println!("{photo}");
      if mark_return && let Some(notice) = panel.return_scanned().await {
        report(notice)?;
      }
    }
  }

  Ok(())
}

/// Check the session against the staff gate, then load the working set.
async fn open_panel(client: ApiClient) -> Result<WatchPanel<ApiClient>> {
  let session = client.session().await.context("checking session")?;
  match RoleGate::staff().evaluate(PrincipalLoad::Loaded(session.user.as_ref())) {
    GateOutcome::Render => {}
    GateOutcome::Redirect(path) => bail!("not authorized for the gate ({path})"),
    GateOutcome::Pending => bail!("session not available"),
  }

  let mut panel = WatchPanel::new(client);
  panel.refresh().await.or_else(report)?;
  Ok(panel)
}

/// Print a notice; error notices become a non-zero exit.
fn report(notice: Notice) -> Result<()> {
  match notice {
    Notice::Success(msg) => {
      println!("{msg}");
      Ok(())
    }
    Notice::Error(msg) => bail!(msg),
  }
}

/// Read one password line from stdin.
fn read_password() -> Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() {
    Args::command().debug_assert();
  }

  #[test]
  fn scan_return_flag_parses() {
    let args = Args::try_parse_from(["gatepass", "scan", "a@x.com", "--return"]).unwrap();
    assert!(matches!(
      args.command,
      Command::Scan { ref code, mark_return: true } if code == "a@x.com"
    ));
  }

  #[test]
  fn config_file_fields_are_optional() {
    let cfg: ConfigFile = toml::from_str(r#"url = "http://gate:3000""#).unwrap();
    assert_eq!(cfg.url, "http://gate:3000");
    assert!(cfg.token_file.is_none());
  }

  #[test]
  fn token_file_round_trip() {
    let path = std::env::temp_dir()
      .join(format!("gatepass-token-{}", std::process::id()))
      .join("token");
    write_token(&path, "abc123").unwrap();
    assert_eq!(read_token(&path).as_deref(), Some("abc123"));
    std::fs::remove_file(&path).unwrap();
    assert_eq!(read_token(&path), None);
  }
}
