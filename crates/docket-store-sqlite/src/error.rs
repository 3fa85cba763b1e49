//! Error type for `docket-store-sqlite`.

use docket_core::{ErrorKind, store::StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] docket_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("blob storage error: {0}")]
  Io(#[from] std::io::Error),

  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("content of document {0} is missing from storage")]
  BlobMissing(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("no user with email {0:?}")]
  UnknownEmail(String),

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Conflict(String),
}

impl From<tokio_rusqlite::Error> for Error {
  /// Domain errors raised inside a `call` closure travel back boxed in
  /// `tokio_rusqlite::Error::Other`; unwrap them here so callers see the
  /// original variant.
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(boxed) => match boxed.downcast::<Error>() {
        Ok(inner) => *inner,
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      },
      other => Error::Database(other),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Error::Database(e.into()) }
}

/// Box a domain error so it can leave a `call` closure.
pub(crate) fn abort(e: impl Into<Error>) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e.into()))
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::DocumentNotFound(_)
      | Error::BlobMissing(_)
      | Error::UserNotFound(_)
      | Error::UnknownEmail(_) => ErrorKind::NotFound,
      Error::Validation(_) => ErrorKind::Validation,
      Error::Conflict(_) => ErrorKind::Conflict,
      Error::Database(_)
      | Error::Io(_)
      | Error::Task(_)
      | Error::Uuid(_)
      | Error::DateParse(_)
      | Error::Corrupt(_) => ErrorKind::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
