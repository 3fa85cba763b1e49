//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::{io, path::Path, sync::Arc};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docket_core::{
  activity::{ActivityLog, NewActivity, format_timestamp, parse_timestamp},
  blob::BlobStore,
  comment::{Comment, NewComment},
  document::{
    Document, DocumentMetadata, DocumentOverview, Download, MetadataEdit, NewDocument,
    SearchHit, blob_path, normalize_principals, normalize_tags, normalize_title, upload_name,
  },
  error::non_blank,
  store::DocumentStore,
  user::{NewUser, Role, User, UserCredentials, normalize_email},
};

use crate::{
  Error, Result,
  encode::{
    RawActivity, RawComment, RawCredentials, RawHit, RawMetadata, RawOverview, RawUser,
    USER_COLUMNS, contains_pattern, encode_dt, encode_uuid, join_tags,
  },
  error::abort,
  schema::SCHEMA,
};

const ACTIVITY_SELECT: &str = "
  SELECT a.id, a.user_id, u.username, a.action, a.document_id, d.title, a.timestamp
  FROM activity_logs a
  LEFT JOIN users     u ON u.id          = a.user_id
  LEFT JOIN documents d ON d.document_id = a.document_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket document store backed by a single SQLite file plus a blob store
/// for file content.
///
/// Cloning is cheap: the connection and the blob store are both shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  blobs: Arc<dyn BlobStore>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, blobs: impl BlobStore) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, blobs: Arc::new(blobs) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory(blobs: impl BlobStore) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, blobs: Arc::new(blobs) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// Synchronous helpers run on the connection thread. They take a plain
// `Connection` so they work equally on a `Transaction`.

fn document_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM documents WHERE document_id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn user_exists(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn email_taken(conn: &rusqlite::Connection, email: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE email = ?1", [email], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn fetch_user(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
      [id],
      |row| RawUser::from_row(row, 0),
    )
    .optional()
}

/// Swap the document's tag set for `tags`. Each name is upserted and its id
/// returned in one statement.
fn replace_tags(conn: &rusqlite::Connection, id: &str, tags: &[String]) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM document_tags WHERE document_id = ?1", [id])?;

  let mut upsert = conn.prepare_cached(
    "INSERT INTO tags (tag_name) VALUES (?1)
     ON CONFLICT(tag_name) DO UPDATE SET tag_name = excluded.tag_name
     RETURNING tag_id",
  )?;
  let mut link = conn.prepare_cached(
    "INSERT OR IGNORE INTO document_tags (document_id, tag_id) VALUES (?1, ?2)",
  )?;
  for tag in tags {
    let tag_id: i64 = upsert.query_row([tag], |row| row.get(0))?;
    link.execute(rusqlite::params![id, tag_id])?;
  }
  Ok(())
}

fn replace_permissions(
  conn:       &rusqlite::Connection,
  id:         &str,
  principals: &[String],
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM permissions WHERE document_id = ?1", [id])?;

  let mut insert = conn.prepare_cached(
    "INSERT OR IGNORE INTO permissions (document_id, user_email) VALUES (?1, ?2)",
  )?;
  for email in principals {
    insert.execute(rusqlite::params![id, email])?;
  }
  Ok(())
}

fn touch(conn: &rusqlite::Connection, id: &str, now: &str) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE documents SET last_updated = ?2 WHERE document_id = ?1",
    rusqlite::params![id, now],
  )?;
  Ok(())
}

fn load_tags(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT t.tag_name
     FROM document_tags dt
     JOIN tags t ON t.tag_id = dt.tag_id
     WHERE dt.document_id = ?1
     ORDER BY t.tag_name",
  )?;
  stmt
    .query_map([id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn load_permissions(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT user_email FROM permissions WHERE document_id = ?1 ORDER BY user_email",
  )?;
  stmt
    .query_map([id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn load_comments(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Vec<RawComment>> {
  let mut stmt = conn.prepare_cached(
    "SELECT id, document_id, user_email, comment_text, timestamp
     FROM comments
     WHERE document_id = ?1
     ORDER BY timestamp, id",
  )?;
  stmt
    .query_map([id], RawComment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn load_metadata(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawMetadata>> {
  let row = conn
    .query_row(
      "SELECT d.document_id, d.title, u.email, d.last_updated
       FROM documents d
       JOIN users u ON u.id = d.uploaded_by
       WHERE d.document_id = ?1",
      [id],
      |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, String>(2)?,
          row.get::<_, String>(3)?,
        ))
      },
    )
    .optional()?;

  let Some((document_id, title, uploaded_by, last_updated)) = row else {
    return Ok(None);
  };
  Ok(Some(RawMetadata {
    tags: load_tags(conn, id)?,
    permissions: load_permissions(conn, id)?,
    document_id,
    title,
    uploaded_by,
    last_updated,
  }))
}

/// `(document_id, title, uploader email)` of every document matching `sql`.
fn document_heads(
  conn:   &rusqlite::Connection,
  sql:    &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<(String, String, String)>> {
  let mut stmt = conn.prepare(sql)?;
  stmt
    .query_map(params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Registration & sessions ───────────────────────────────────────────────

  async fn begin_registration(&self, email: String, otp_hash: String) -> Result<()> {
    let email = normalize_email(&email)?;
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if email_taken(&tx, &email)? {
          return Err(abort(Error::Conflict(format!("{email} is already registered"))));
        }
        let pending = tx
          .query_row("SELECT 1 FROM otp_verification WHERE email = ?1", [&email], |_| {
            Ok(())
          })
          .optional()?;
        if pending.is_some() {
          return Err(abort(Error::Conflict(format!(
            "a verification code was already sent to {email}"
          ))));
        }
        tx.execute(
          "INSERT INTO otp_verification (email, otp_hash, verified, created_at)
           VALUES (?1, ?2, 0, ?3)",
          rusqlite::params![email, otp_hash, now],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn cancel_registration(&self, email: String) -> Result<()> {
    let email = normalize_email(&email)?;

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM otp_verification WHERE email = ?1 AND verified = 0",
          [email],
        )?)
      })
      .await?;
    debug!(removed, "pending registration withdrawn");
    Ok(())
  }

  async fn complete_registration(&self, otp_hash: String, user: NewUser) -> Result<User> {
    let email = normalize_email(&user.email)?;
    let username = non_blank("username", &user.username)?;
    let role = user.role;
    let role_str = role.as_ref().to_owned();
    let password_hash = user.password_hash;

    let (id, email, username) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if email_taken(&tx, &email)? {
          return Err(abort(Error::Conflict(format!("{email} is already registered"))));
        }
        let stored: Option<String> = tx
          .query_row(
            "SELECT otp_hash FROM otp_verification WHERE email = ?1 AND verified = 0",
            [&email],
            |row| row.get(0),
          )
          .optional()?;
        match stored {
          None => {
            return Err(abort(Error::Validation(format!(
              "no pending verification for {email}"
            ))));
          }
          Some(stored) if stored != otp_hash => {
            return Err(abort(Error::Validation("invalid verification code".into())));
          }
          Some(_) => {}
        }

        tx.execute(
          "UPDATE otp_verification SET verified = 1 WHERE email = ?1",
          [&email],
        )?;
        tx.execute(
          "INSERT INTO users (username, email, password_hash, role, verified)
           VALUES (?1, ?2, ?3, ?4, 1)",
          rusqlite::params![username, email, password_hash, role_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, email, username))
      })
      .await?;

    info!(user_id = id, %email, %role, "user registered");
    Ok(User { id, username, email, role, verified: true })
  }

  async fn find_credentials(&self, email: String) -> Result<Option<UserCredentials>> {
    let email = normalize_email(&email)?;

    let raw: Option<RawCredentials> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
              [email],
              |row| {
                Ok(RawCredentials {
                  user:          RawUser::from_row(row, 0)?,
                  password_hash: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredentials::into_credentials).transpose()
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_user(conn, id)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn set_role(&self, email: String, role: Role) -> Result<User> {
    let email = normalize_email(&email)?;
    let role_str = role.as_ref().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users SET role = ?2 WHERE email = ?1",
          rusqlite::params![email, role_str],
        )?;
        if changed == 0 {
          return Err(abort(Error::UnknownEmail(email)));
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
          [&email],
          |row| RawUser::from_row(row, 0),
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let user = raw.into_user()?;
    info!(user_id = user.id, role = %user.role, "role changed");
    Ok(user)
  }

  async fn create_session(
    &self,
    user_id:    i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let now = encode_dt(Utc::now());
    let expires = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !user_exists(&tx, user_id)? {
          return Err(abort(Error::UserNotFound(user_id)));
        }
        tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", [&now])?;
        tx.execute(
          "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, user_id, expires],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(&self, token_hash: String, now: DateTime<Utc>) -> Result<Option<User>> {
    let now = encode_dt(now);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT u.id, u.username, u.email, u.role, u.verified
               FROM sessions s
               JOIN users u ON u.id = s.user_id
               WHERE s.token_hash = ?1 AND s.expires_at > ?2",
              rusqlite::params![token_hash, now],
              |row| RawUser::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn end_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn upload(&self, input: NewDocument) -> Result<Document> {
    let title = normalize_title(&input.title)?;
    let tags = normalize_tags(&input.tags)?;
    let permissions = normalize_principals(&input.permissions)?;

    let document_id = Uuid::new_v4();
    let document = Document {
      document_id,
      file_path: blob_path(document_id, &input.filename),
      filename: upload_name(&input.filename),
      title,
      uploaded_by: input.uploaded_by,
      last_updated: Utc::now().trunc_subsecs(6),
    };

    let id_str      = encode_uuid(document_id);
    let title       = document.title.clone();
    let filename    = document.filename.clone();
    let file_path   = document.file_path.clone();
    let uploaded_by = document.uploaded_by;
    let at_str      = encode_dt(document.last_updated);
    let content     = input.content;
    let blobs       = Arc::clone(&self.blobs);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !user_exists(&tx, uploaded_by)? {
          return Err(abort(Error::UserNotFound(uploaded_by)));
        }
        tx.execute(
          "INSERT INTO documents
             (document_id, title, filename, file_path, uploaded_by, last_updated)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, title, filename, file_path, uploaded_by, at_str],
        )?;
        replace_tags(&tx, &id_str, &tags)?;
        replace_permissions(&tx, &id_str, &permissions)?;

        // The blob goes last so any earlier failure leaves nothing on disk.
        blobs.write(&file_path, &content).map_err(abort)?;
        if let Err(e) = tx.commit() {
          if let Err(cleanup) = blobs.delete(&file_path) {
            warn!(blob = %file_path, error = %cleanup, "upload: orphaned blob after failed commit");
          }
          return Err(e.into());
        }
        Ok(())
      })
      .await?;

    info!(%document_id, uploaded_by = document.uploaded_by, "document uploaded");
    Ok(document)
  }

  async fn get_metadata(&self, document_id: Uuid) -> Result<DocumentMetadata> {
    let id_str = encode_uuid(document_id);

    let raw = self
      .conn
      .call(move |conn| Ok(load_metadata(conn, &id_str)?))
      .await?;

    raw
      .ok_or(Error::DocumentNotFound(document_id))?
      .into_metadata()
  }

  async fn download(&self, document_id: Uuid) -> Result<Download> {
    let id_str = encode_uuid(document_id);

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT filename, file_path FROM documents WHERE document_id = ?1",
              [id_str],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;
    let (filename, file_path) = row.ok_or(Error::DocumentNotFound(document_id))?;

    let blobs = Arc::clone(&self.blobs);
    let content = tokio::task::spawn_blocking(move || blobs.read(&file_path))
      .await?
      .map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::BlobMissing(document_id),
        _ => Error::Io(e),
      })?;

    Ok(Download { filename, content })
  }

  async fn update_metadata(
    &self,
    document_id: Uuid,
    edit:        MetadataEdit,
  ) -> Result<DocumentMetadata> {
    let edit = edit.normalized()?;
    let id_str = encode_uuid(document_id);
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !document_exists(&tx, &id_str)? {
          return Err(abort(Error::DocumentNotFound(document_id)));
        }
        if let Some(title) = &edit.title {
          tx.execute(
            "UPDATE documents SET title = ?2 WHERE document_id = ?1",
            rusqlite::params![id_str, title],
          )?;
        }
        if let Some(tags) = &edit.tags {
          replace_tags(&tx, &id_str, tags)?;
        }
        if let Some(permissions) = &edit.permissions {
          replace_permissions(&tx, &id_str, permissions)?;
        }
        touch(&tx, &id_str, &now)?;
        let raw = load_metadata(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    info!(%document_id, "document metadata updated");
    raw
      .ok_or(Error::DocumentNotFound(document_id))?
      .into_metadata()
  }

  async fn set_tags(&self, document_id: Uuid, tags: Vec<String>) -> Result<()> {
    let tags = normalize_tags(&tags)?;
    let id_str = encode_uuid(document_id);
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !document_exists(&tx, &id_str)? {
          return Err(abort(Error::DocumentNotFound(document_id)));
        }
        replace_tags(&tx, &id_str, &tags)?;
        touch(&tx, &id_str, &now)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_permissions(&self, document_id: Uuid, principals: Vec<String>) -> Result<()> {
    let principals = normalize_principals(&principals)?;
    let id_str = encode_uuid(document_id);
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !document_exists(&tx, &id_str)? {
          return Err(abort(Error::DocumentNotFound(document_id)));
        }
        replace_permissions(&tx, &id_str, &principals)?;
        touch(&tx, &id_str, &now)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, document_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(document_id);

    let file_path: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let file_path: Option<String> = tx
          .query_row(
            "SELECT file_path FROM documents WHERE document_id = ?1",
            [&id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(file_path) = file_path else {
          return Err(abort(Error::DocumentNotFound(document_id)));
        };
        // Cascades to document_tags and permissions.
        tx.execute("DELETE FROM documents WHERE document_id = ?1", [&id_str])?;
        tx.commit()?;
        Ok(file_path)
      })
      .await?;

    // The row is gone, so the blob is unreachable either way; a failure here
    // only leaves an orphan behind.
    let blobs = Arc::clone(&self.blobs);
    let path = file_path.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || blobs.delete(&path)).await? {
      warn!(blob = %file_path, error = %e, "delete: blob could not be removed");
    }

    info!(%document_id, "document deleted");
    Ok(())
  }

  async fn list_documents(&self) -> Result<Vec<DocumentOverview>> {
    let raws: Vec<RawOverview> = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let heads = document_heads(
          &tx,
          "SELECT d.document_id, d.title, u.email
           FROM documents d
           JOIN users u ON u.id = d.uploaded_by
           ORDER BY d.title, d.document_id",
          [],
        )?;
        let mut out = Vec::with_capacity(heads.len());
        for (document_id, title, uploaded_by) in heads {
          out.push(RawOverview {
            tags: load_tags(&tx, &document_id)?,
            comments: load_comments(&tx, &document_id)?,
            document_id,
            title,
            uploaded_by,
          });
        }
        Ok(out)
      })
      .await?;

    raws.into_iter().map(RawOverview::into_overview).collect()
  }

  async fn search<'a>(&'a self, query: &'a str) -> Result<Vec<SearchHit>> {
    let needle = query.trim();
    if needle.is_empty() {
      return Err(docket_core::Error::EmptyQuery.into());
    }
    // LIKE is ASCII case-insensitive, which is all the matching promises.
    let pattern = contains_pattern(needle);

    let raws: Vec<RawHit> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let heads = document_heads(
          &tx,
          r"SELECT d.document_id, d.title, u.email
            FROM documents d
            JOIN users u ON u.id = d.uploaded_by
            WHERE d.title LIKE ?1 ESCAPE '\'
               OR u.email LIKE ?1 ESCAPE '\'
               OR EXISTS (
                    SELECT 1
                    FROM document_tags dt
                    JOIN tags t ON t.tag_id = dt.tag_id
                    WHERE dt.document_id = d.document_id
                      AND t.tag_name LIKE ?1 ESCAPE '\'
                  )
            ORDER BY d.title, d.document_id",
          [&pattern],
        )?;
        let mut out = Vec::with_capacity(heads.len());
        for (document_id, title, uploaded_by) in heads {
          out.push(RawHit {
            tags: join_tags(&load_tags(&tx, &document_id)?),
            document_id,
            title,
            uploaded_by,
          });
        }
        Ok(out)
      })
      .await?;

    raws.into_iter().map(RawHit::into_hit).collect()
  }

  // ── Activity log ──────────────────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityLog> {
    let action = non_blank("action", &input.action)?;
    let timestamp = format_timestamp(parse_timestamp(&input.timestamp)?);
    let user_id = input.user_id;
    let document_id = input.document_id.map(encode_uuid);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO activity_logs (user_id, action, document_id, timestamp)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, action, document_id, timestamp],
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(
          &format!("{ACTIVITY_SELECT} WHERE a.id = ?1"),
          [id],
          RawActivity::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_activity()
  }

  async fn activity_for_user(&self, user_id: i64) -> Result<Vec<ActivityLog>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{ACTIVITY_SELECT} WHERE a.user_id = ?1 ORDER BY a.timestamp, a.id"
        ))?;
        let rows = stmt
          .query_map([user_id], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  async fn all_activity(&self) -> Result<Vec<ActivityLog>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{ACTIVITY_SELECT} ORDER BY a.timestamp, a.id"))?;
        let rows = stmt
          .query_map([], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment_text = non_blank("comment", &input.comment_text)?;
    let user_email = normalize_email(&input.user_email)?;
    let document_id = input.document_id;
    let timestamp = Utc::now().trunc_subsecs(6);

    let id_str = encode_uuid(document_id);
    let at_str = encode_dt(timestamp);
    let (email, text) = (user_email.clone(), comment_text.clone());

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !document_exists(&tx, &id_str)? {
          return Err(abort(Error::DocumentNotFound(document_id)));
        }
        tx.execute(
          "INSERT INTO comments (document_id, user_email, comment_text, timestamp)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, text, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(Comment { id, document_id, user_email, comment_text, timestamp })
  }

  async fn comments_for(&self, document_id: Uuid) -> Result<Vec<Comment>> {
    let id_str = encode_uuid(document_id);

    let raws = self
      .conn
      .call(move |conn| Ok(load_comments(conn, &id_str)?))
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
