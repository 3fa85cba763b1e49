//! Users, roles, and registration inputs.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Access level of a user. Stored as its lowercase name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Admin,
  Editor,
  Viewer,
}

impl Role {
  /// Parse a role name supplied by a caller.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim().parse().map_err(|_| Error::InvalidRole(s.to_owned()))
  }

  /// Whether this role may upload, edit, or delete documents.
  pub fn can_write(self) -> bool { matches!(self, Self::Admin | Self::Editor) }

  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }
}

/// A registered account. The password hash never leaves the store through
/// this type; see [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       i64,
  pub username: String,
  /// Always lowercase.
  pub email:    String,
  pub role:     Role,
  pub verified: bool,
}

/// A user row together with its password hash, used only by login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  /// PHC string produced by argon2.
  pub password_hash: String,
}

/// Input to [`crate::store::DocumentStore::complete_registration`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

/// Lowercase and trim an email address; the result is the only form ever
/// used for lookups or inserts.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain))
      if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) =>
    {
      Ok(email)
    }
    _ => Err(Error::InvalidEmail(raw.to_owned())),
  }
}
