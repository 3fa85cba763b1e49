//! Append-only comments, attached to documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:           i64,
  pub document_id:  Uuid,
  pub user_email:   String,
  pub comment_text: String,
  /// Server-assigned at insert.
  pub timestamp:    DateTime<Utc>,
}

/// Input to [`crate::store::DocumentStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub document_id:  Uuid,
  pub user_email:   String,
  pub comment_text: String,
}
