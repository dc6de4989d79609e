//! Runtime server configuration, deserialised from `config.toml` with
//! `ROLODEX_*` environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rolodex_api::ApiConfig;
use rolodex_core::permission::PermissionConfig;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_site() -> String { "main".to_owned() }

fn default_store_path() -> PathBuf { PathBuf::from("rolodex.sqlite") }

fn default_use_object_permissions() -> bool { true }

fn default_anonymous_user_name() -> String { "AnonymousUser".to_owned() }

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  /// Public URL of the server, without the `/api` suffix. Defaults to
  /// `http://{host}:{port}`.
  #[serde(default)]
  pub base_url:               Option<String>,
  /// Site recorded on rows created through the API.
  #[serde(default = "default_site")]
  pub site:                   String,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  #[serde(default = "default_use_object_permissions")]
  pub use_object_permissions: bool,
  #[serde(default = "default_anonymous_user_name")]
  pub anonymous_user_name:    String,
}

impl ServerConfig {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROLODEX"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn permissions(&self) -> PermissionConfig {
    PermissionConfig {
      use_object_permissions: self.use_object_permissions,
      anonymous_user_name:    self.anonymous_user_name.clone(),
    }
  }

  pub fn api(&self) -> ApiConfig {
    let base = self
      .base_url
      .clone()
      .unwrap_or_else(|| format!("http://{}", self.address()));
    ApiConfig {
      base_url:    format!("{}/api", base.trim_end_matches('/')),
      site:        self.site.clone(),
      permissions: self.permissions(),
    }
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn expanded_store_path(&self) -> PathBuf {
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

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.port, 8000);
    assert!(cfg.use_object_permissions);
    assert_eq!(cfg.anonymous_user_name, "AnonymousUser");
    assert_eq!(cfg.api().base_url, "http://127.0.0.1:8000/api");
  }

  #[test]
  fn tilde_expands_to_home() {
    let cfg = ServerConfig {
      store_path: PathBuf::from("~/contacts.sqlite"),
      ..ServerConfig::load(Path::new("does-not-exist.toml")).unwrap()
    };
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(cfg.expanded_store_path(), PathBuf::from(home).join("contacts.sqlite"));
    }
  }
}
