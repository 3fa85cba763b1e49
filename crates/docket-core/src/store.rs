//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! The HTTP layer (`docket-api`) depends on this abstraction, not on any
//! concrete backend. Every method is one atomic unit: either all of its
//! statements commit or none do.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  ErrorKind,
  activity::{ActivityLog, NewActivity},
  comment::{Comment, NewComment},
  document::{
    Document, DocumentMetadata, DocumentOverview, Download, MetadataEdit, NewDocument,
    SearchHit,
  },
  user::{NewUser, Role, User, UserCredentials},
};

/// Backend errors must say which [`ErrorKind`] they belong to.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

/// Abstraction over a Docket storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: StoreError;

  // ── Registration & sessions ───────────────────────────────────────────

  /// Record a pending verification code (already hashed) for `email`.
  ///
  /// Conflict if the email belongs to a user or already has a pending code.
  fn begin_registration(
    &self,
    email: String,
    otp_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Withdraw a pending (unverified) code for `email`, so registration can be
  /// started again. Nothing to withdraw is not an error.
  fn cancel_registration(
    &self,
    email: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Check `otp_hash` against the pending code for `user.email` and, if it
  /// matches, mark it verified and create the (verified) user.
  fn complete_registration(
    &self,
    otp_hash: String,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by (normalised) email.
  fn find_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Change a user's role. Not found if no user has that email.
  fn set_role(
    &self,
    email: String,
    role: Role,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Persist a session under the SHA-256 of its bearer token.
  fn create_session(
    &self,
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token hash to its user if the session has not expired at `now`.
  fn session_user(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn end_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Store a new document: row, tags, permissions, and blob together.
  /// Not found if the uploader does not exist.
  fn upload(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  fn get_metadata(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<DocumentMetadata, Self::Error>> + Send + '_;

  /// Read the document's blob. Not found if the row or the blob is missing.
  fn download(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Download, Self::Error>> + Send + '_;

  /// Apply a partial metadata update and return the resulting metadata.
  fn update_metadata(
    &self,
    document_id: Uuid,
    edit: MetadataEdit,
  ) -> impl Future<Output = Result<DocumentMetadata, Self::Error>> + Send + '_;

  /// Replace the document's full tag set.
  fn set_tags(
    &self,
    document_id: Uuid,
    tags: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the document's full permission set.
  fn set_permissions(
    &self,
    document_id: Uuid,
    principals: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove the document row (cascading tags and permissions) and its blob.
  /// Comments and activity logs are kept.
  fn delete(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every document with its tags and comment thread.
  fn list_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<DocumentOverview>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over title, tag names, and uploader
  /// email. A blank query is a validation error.
  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;

  // ── Activity log ──────────────────────────────────────────────────────

  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<ActivityLog, Self::Error>> + Send + '_;

  fn activity_for_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<ActivityLog>, Self::Error>> + Send + '_;

  fn all_activity(
    &self,
  ) -> impl Future<Output = Result<Vec<ActivityLog>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Append a comment. Not found if the document does not exist right now.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn comments_for(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
