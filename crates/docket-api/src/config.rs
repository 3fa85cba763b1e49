//! Runtime server configuration, deserialised from `config.toml` overlaid with
//! `DOCKET_*` environment variables.

use std::{fmt, path::PathBuf};

use docket_core::user::Role;
use serde::Deserialize;

/// Top-level server configuration. Every field has a default so an empty
/// config file (or none at all) yields a runnable local server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_database_path")]
  pub database_path:      PathBuf,
  /// Directory holding document blobs.
  #[serde(default = "default_upload_dir")]
  pub upload_dir:         PathBuf,
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs:   u64,
  /// Upper bound on any request body, uploads included.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:   usize,
  /// Roles a new account may pick for itself during OTP verification.
  #[serde(default = "default_registration_roles")]
  pub registration_roles: Vec<Role>,
  /// Generative-language passthrough. The `/assist` routes answer 503
  /// while this is absent.
  #[serde(default)]
  pub assist:             Option<AssistConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               default_host(),
      port:               default_port(),
      database_path:      default_database_path(),
      upload_dir:         default_upload_dir(),
      session_ttl_secs:   default_session_ttl_secs(),
      max_upload_bytes:   default_max_upload_bytes(),
      registration_roles: default_registration_roles(),
      assist:             None,
    }
  }
}

#[derive(Clone, Deserialize)]
pub struct AssistConfig {
  /// Full `…:generateContent` URL of the model to call.
  #[serde(default = "default_assist_endpoint")]
  pub endpoint:     String,
  pub api_key:      String,
  #[serde(default = "default_assist_timeout_secs")]
  pub timeout_secs: u64,
}

impl fmt::Debug for AssistConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AssistConfig")
      .field("endpoint", &self.endpoint)
      .field("api_key", &"<redacted>")
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_database_path() -> PathBuf { PathBuf::from("docket.db") }

fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }

fn default_session_ttl_secs() -> u64 { 3600 }

fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }

fn default_registration_roles() -> Vec<Role> { vec![Role::Admin, Role::Editor, Role::Viewer] }

fn default_assist_endpoint() -> String {
  "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
    .to_owned()
}

fn default_assist_timeout_secs() -> u64 { 60 }
