//! Error types for `docket-core`.

use thiserror::Error;

/// Coarse classification shared by every layer. Backends map their own error
/// types onto it so the HTTP layer can pick a status code without knowing the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A referenced document, user, or relation does not exist.
  NotFound,
  /// Malformed caller input.
  Validation,
  /// A uniqueness rule would be violated (e.g. duplicate registration).
  Conflict,
  /// Missing or invalid credentials.
  Unauthorized,
  /// Database or blob-storage failure.
  Storage,
}

/// Input validation failures raised while normalising domain values.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid role {0:?}: expected one of admin, editor, viewer")]
  InvalidRole(String),

  #[error("invalid timestamp {0:?}: expected YYYY-MM-DD HH:MM:SS")]
  InvalidTimestamp(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("{0} must not be blank")]
  Blank(&'static str),

  #[error("search query must not be empty")]
  EmptyQuery,
}

impl Error {
  /// Every core error is a validation error; the method exists so callers can
  /// classify uniformly with backend errors.
  pub fn kind(&self) -> ErrorKind { ErrorKind::Validation }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Trim `value` and reject it if nothing is left.
pub fn non_blank(field: &'static str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Blank(field));
  }
  Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn non_blank_trims() {
    assert_eq!(non_blank("title", "  Spec \n").unwrap(), "Spec");
  }

  #[test]
  fn non_blank_rejects_whitespace() {
    let err = non_blank("title", " \t ").unwrap_err();
    assert!(matches!(err, Error::Blank("title")));
    assert_eq!(err.kind(), ErrorKind::Validation);
  }
}
