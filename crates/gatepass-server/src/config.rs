//! Runtime server configuration.
//!
//! Read from an optional TOML file layered under `GATEPASS_*` environment
//! variables, e.g. `GATEPASS_PORT=8080`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Duration;
use serde::Deserialize;

/// Longest session lifetime accepted from configuration.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Deserialised from `config.toml`; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub session_ttl_hours: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              3000,
      store_path:        PathBuf::from("~/.local/share/gatepass/gatepass.db"),
      session_ttl_hours: 12,
    }
  }
}

impl ServerConfig {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("GATEPASS"))
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject values the server cannot run with.
  pub fn validate(&self) -> anyhow::Result<()> {
    anyhow::ensure!(
      (1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours),
      "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
      self.session_ttl_hours
    );
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Session lifetime, clamped to [`MAX_SESSION_TTL_HOURS`].
  pub fn session_ttl(&self) -> Duration {
    Duration::try_hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
      .unwrap_or(Duration::hours(1))
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(src: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(src, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn missing_keys_fall_back_to_defaults() {
    let cfg = from_toml("port = 8080");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.session_ttl(), Duration::hours(12));
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn absolute_store_path_is_untouched() {
    let cfg = from_toml(r#"store_path = "/var/lib/gatepass.db""#);
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("/var/lib/gatepass.db"));
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/gatepass.toml")).unwrap();
    assert!(cfg.session_ttl_hours > 0);
  }

  #[test]
  fn session_ttl_must_be_in_range() {
    assert!(from_toml("session_ttl_hours = 24").validate().is_ok());
    assert!(from_toml("session_ttl_hours = 0").validate().is_err());
    assert!(from_toml("session_ttl_hours = -5").validate().is_err());

    let huge = from_toml("session_ttl_hours = 10000000000000");
    let err = huge.validate().unwrap_err();
    assert!(err.to_string().contains("session_ttl_hours"));
    assert_eq!(huge.session_ttl(), Duration::hours(MAX_SESSION_TTL_HOURS));
  }

  #[test]
  fn load_rejects_oversized_ttl() {
    let path = std::env::temp_dir().join(format!("gatepass-ttl-{}.toml", std::process::id()));
    std::fs::write(&path, "session_ttl_hours = 100000000\n").unwrap();
    let result = ServerConfig::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(result.is_err());
  }
}
