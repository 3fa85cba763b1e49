//! Activity log entries: an append-only audit trail of user actions.
//!
//! Timestamps are caller-supplied wall-clock values in a single fixed format
//! ([`TIMESTAMP_FORMAT`]); anything else is rejected at the boundary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The only accepted timestamp layout, e.g. `2024-01-01 10:00:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
    .map_err(|_| Error::InvalidTimestamp(s.to_owned()))
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
  ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A stored log entry, with the user and document resolved for display.
///
/// `username` and `document_title` are `None` once the referenced row is
/// gone; the entry itself is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
  pub id:             i64,
  pub user_id:        i64,
  pub username:       Option<String>,
  pub action:         String,
  pub document_id:    Option<Uuid>,
  pub document_title: Option<String>,
  #[serde(with = "timestamp_serde")]
  pub timestamp:      NaiveDateTime,
}

/// Input to [`crate::store::DocumentStore::record_activity`].
#[derive(Debug, Clone)]
pub struct NewActivity {
  pub user_id:     i64,
  pub action:      String,
  pub document_id: Option<Uuid>,
  /// Must match [`TIMESTAMP_FORMAT`].
  pub timestamp:   String,
}

mod timestamp_serde {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::format_timestamp(*ts))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    super::parse_timestamp(&raw).map_err(D::Error::custom)
  }
}
