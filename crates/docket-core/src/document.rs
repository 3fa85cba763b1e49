//! Document types and the normalisation rules applied to their metadata.
//!
//! A document is a blob on disk plus one row of metadata. Tags and
//! permissions live in association tables and are always replaced as whole
//! sets, never merged.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, comment::Comment, error::non_blank, user::normalize_email};

// ─── Stored document ─────────────────────────────────────────────────────────

/// A `documents` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id:  Uuid,
  pub title:        String,
  /// The name the file was uploaded under; see [`upload_name`].
  pub filename:     String,
  /// Blob path relative to the blob store root; see [`blob_path`].
  pub file_path:    String,
  /// Id of the uploading user.
  pub uploaded_by:  i64,
  pub last_updated: DateTime<Utc>,
}

/// Input to [`crate::store::DocumentStore::upload`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub title:       String,
  /// Name the file was uploaded under; only its final path component is kept.
  pub filename:    String,
  pub content:     Vec<u8>,
  pub tags:        Vec<String>,
  /// Principal emails granted access.
  pub permissions: Vec<String>,
  pub uploaded_by: i64,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// The metadata view of a document, with the uploader resolved to an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
  pub document_id:  Uuid,
  pub title:        String,
  /// Sorted by name.
  pub tags:         Vec<String>,
  /// Sorted by email.
  pub permissions:  Vec<String>,
  pub uploaded_by:  String,
  pub last_updated: DateTime<Utc>,
}

/// One entry of the document listing, including the comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOverview {
  pub document_id: Uuid,
  pub title:       String,
  pub tags:        Vec<String>,
  pub uploaded_by: String,
  pub comments:    Vec<Comment>,
}

/// A search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub document_id: Uuid,
  pub title:       String,
  /// All of the document's tag names, sorted and comma-joined.
  pub tags:        String,
  /// Uploader email.
  pub uploaded_by: String,
}

/// A blob read back from storage.
#[derive(Debug, Clone)]
pub struct Download {
  /// The name the file was uploaded under.
  pub filename: String,
  pub content:  Vec<u8>,
}

// ─── Edits ───────────────────────────────────────────────────────────────────

/// A partial metadata update. `None` leaves a field untouched; `Some(vec![])`
/// clears a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataEdit {
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub tags:        Option<Vec<String>>,
  #[serde(default)]
  pub permissions: Option<Vec<String>>,
}

impl MetadataEdit {
  /// Validate and normalise every supplied field.
  pub fn normalized(self) -> Result<Self> {
    Ok(Self {
      title:       self.title.as_deref().map(normalize_title).transpose()?,
      tags:        self.tags.as_deref().map(normalize_tags).transpose()?,
      permissions: self
        .permissions
        .as_deref()
        .map(normalize_principals)
        .transpose()?,
    })
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

pub fn normalize_title(title: &str) -> Result<String> { non_blank("title", title) }

/// Trim, reject blanks, de-duplicate, and sort. Tag names stay case-sensitive.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
  let set = tags
    .iter()
    .map(|t| non_blank("tag", t))
    .collect::<Result<BTreeSet<_>>>()?;
  Ok(set.into_iter().collect())
}

/// Normalise each principal as an email, de-duplicate, and sort.
pub fn normalize_principals(principals: &[String]) -> Result<Vec<String>> {
  let set = principals
    .iter()
    .map(|p| normalize_email(p))
    .collect::<Result<BTreeSet<_>>>()?;
  Ok(set.into_iter().collect())
}

// ─── Blob paths ──────────────────────────────────────────────────────────────

/// Blob path for a document: `{document_id}_{ascii_name(filename)}`.
pub fn blob_path(document_id: Uuid, filename: &str) -> String {
  format!("{}_{}", document_id.hyphenated(), ascii_name(filename))
}

/// [`upload_name`] with every character outside `[A-Za-z0-9._-]` replaced
/// with `_`. Safe as a file name and inside a quoted header parameter.
pub fn ascii_name(filename: &str) -> String {
  let name: String = upload_name(filename)
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' }
    })
    .collect();
  if name.trim_matches('.').is_empty() { "file".to_owned() } else { name }
}

/// The name a download is offered under: the final path component of
/// `filename` with control characters dropped and surrounding whitespace
/// trimmed. Falls back to `file` when nothing usable is left.
pub fn upload_name(filename: &str) -> String {
  let base = filename
    .rsplit(['/', '\\'])
    .next()
    .unwrap_or_default();
  let name: String = base.chars().filter(|c| !c.is_control()).collect();
  let name = name.trim();
  if name.trim_matches('.').is_empty() { "file".to_owned() } else { name.to_owned() }
}
