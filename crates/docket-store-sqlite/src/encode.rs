//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Comment, session, and document timestamps are stored as fixed-width
//! RFC 3339 UTC strings (microsecond precision, `Z` suffix) so that text
//! comparison matches chronological order. Activity timestamps keep the
//! caller-facing `YYYY-MM-DD HH:MM:SS` layout. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use docket_core::{
  activity::{ActivityLog, TIMESTAMP_FORMAT},
  comment::Comment,
  document::{DocumentMetadata, DocumentOverview, SearchHit},
  user::{Role, User, UserCredentials},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_activity_ts(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).map_err(|_| Error::Corrupt(format!("unknown role {s:?}")))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// Flatten a sorted tag list into the comma-joined form used by search hits.
pub fn join_tags(tags: &[String]) -> String { tags.join(",") }

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Build a `%needle%` pattern whose wildcards are literal. Pair it with
/// `ESCAPE '\'` in the SQL.
pub fn contains_pattern(needle: &str) -> String {
  let mut pattern = String::with_capacity(needle.len() + 2);
  pattern.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser`]; keep the two in sync.
pub const USER_COLUMNS: &str = "id, username, email, role, verified";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:       i64,
  pub username: String,
  pub email:    String,
  pub role:     String,
  pub verified: bool,
}

impl RawUser {
  /// Read the [`USER_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:       row.get(offset)?,
      username: row.get(offset + 1)?,
      email:    row.get(offset + 2)?,
      role:     row.get(offset + 3)?,
      verified: row.get(offset + 4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:       self.id,
      username: self.username,
      email:    self.email,
      role:     decode_role(&self.role)?,
      verified: self.verified,
    })
  }
}

/// A `users` row plus its password hash.
pub struct RawCredentials {
  pub user:          RawUser,
  pub password_hash: String,
}

impl RawCredentials {
  pub fn into_credentials(self) -> Result<UserCredentials> {
    Ok(UserCredentials {
      user:          self.user.into_user()?,
      password_hash: self.password_hash,
    })
  }
}

/// Raw values of an `activity_logs` row left-joined with `users` and
/// `documents`.
pub struct RawActivity {
  pub id:             i64,
  pub user_id:        i64,
  pub username:       Option<String>,
  pub action:         String,
  pub document_id:    Option<String>,
  pub document_title: Option<String>,
  pub timestamp:      String,
}

impl RawActivity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      user_id:        row.get(1)?,
      username:       row.get(2)?,
      action:         row.get(3)?,
      document_id:    row.get(4)?,
      document_title: row.get(5)?,
      timestamp:      row.get(6)?,
    })
  }

  pub fn into_activity(self) -> Result<ActivityLog> {
    Ok(ActivityLog {
      id:             self.id,
      user_id:        self.user_id,
      username:       self.username,
      action:         self.action,
      document_id:    self.document_id.as_deref().map(decode_uuid).transpose()?,
      document_title: self.document_title,
      timestamp:      decode_activity_ts(&self.timestamp)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub id:           i64,
  pub document_id:  String,
  pub user_email:   String,
  pub comment_text: String,
  pub timestamp:    String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      document_id:  row.get(1)?,
      user_email:   row.get(2)?,
      comment_text: row.get(3)?,
      timestamp:    row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:           self.id,
      document_id:  decode_uuid(&self.document_id)?,
      user_email:   self.user_email,
      comment_text: self.comment_text,
      timestamp:    decode_dt(&self.timestamp)?,
    })
  }
}

/// A `documents` row joined with its uploader's email, plus its sorted tags
/// and permissions.
pub struct RawMetadata {
  pub document_id:  String,
  pub title:        String,
  pub uploaded_by:  String,
  pub last_updated: String,
  pub tags:         Vec<String>,
  pub permissions:  Vec<String>,
}

impl RawMetadata {
  pub fn into_metadata(self) -> Result<DocumentMetadata> {
    Ok(DocumentMetadata {
      document_id:  decode_uuid(&self.document_id)?,
      title:        self.title,
      tags:         self.tags,
      permissions:  self.permissions,
      uploaded_by:  self.uploaded_by,
      last_updated: decode_dt(&self.last_updated)?,
    })
  }
}

/// One document of the listing, with its tags and comment thread.
pub struct RawOverview {
  pub document_id: String,
  pub title:       String,
  pub uploaded_by: String,
  pub tags:        Vec<String>,
  pub comments:    Vec<RawComment>,
}

impl RawOverview {
  pub fn into_overview(self) -> Result<DocumentOverview> {
    Ok(DocumentOverview {
      document_id: decode_uuid(&self.document_id)?,
      title:       self.title,
      tags:        self.tags,
      uploaded_by: self.uploaded_by,
      comments:    self
        .comments
        .into_iter()
        .map(RawComment::into_comment)
        .collect::<Result<_>>()?,
    })
  }
}

/// A search match; `tags` is already comma-joined.
pub struct RawHit {
  pub document_id: String,
  pub title:       String,
  pub uploaded_by: String,
  pub tags:        String,
}

impl RawHit {
  pub fn into_hit(self) -> Result<SearchHit> {
    Ok(SearchHit {
      document_id: decode_uuid(&self.document_id)?,
      title:       self.title,
      tags:        self.tags,
      uploaded_by: self.uploaded_by,
    })
  }
}
