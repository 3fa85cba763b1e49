//! Integration tests for `SqliteStore` against an in-memory database and a
//! temporary upload directory.

use std::{
  io,
  sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use docket_core::{
  ErrorKind,
  activity::NewActivity,
  blob::{BlobStore, FsBlobStore},
  comment::NewComment,
  document::{MetadataEdit, NewDocument},
  store::{DocumentStore, StoreError},
  user::{NewUser, Role, User},
};
use tempfile::TempDir;
use uuid::Uuid;

use crate::{Error, SqliteStore};

struct Fixture {
  store: SqliteStore,
  blobs: FsBlobStore,
  _dir:  TempDir,
}

async fn fixture() -> Fixture {
  let dir = tempfile::tempdir().expect("temp dir");
  let blobs = FsBlobStore::open(dir.path().join("uploads")).expect("blob store");
  let store = SqliteStore::open_in_memory(blobs.clone())
    .await
    .expect("in-memory store");
  Fixture { store, blobs, _dir: dir }
}

async fn register(s: &SqliteStore, email: &str, role: Role) -> User {
  s.begin_registration(email.into(), "otp-hash".into())
    .await
    .unwrap();
  s.complete_registration("otp-hash".into(), NewUser {
    username:      email.split('@').next().unwrap_or("user").into(),
    email:         email.into(),
    password_hash: "$argon2id$stub".into(),
    role,
  })
  .await
  .unwrap()
}

fn new_doc(uploader: i64, title: &str, tags: &[&str]) -> NewDocument {
  NewDocument {
    title:       title.into(),
    filename:    "notes.txt".into(),
    content:     b"hello docket".to_vec(),
    tags:        tags.iter().map(|t| (*t).to_owned()).collect(),
    permissions: vec!["a@x.com".into()],
    uploaded_by: uploader,
  }
}

fn strings(v: &[&str]) -> Vec<String> { v.iter().map(|s| (*s).to_owned()).collect() }

// ─── Registration & sessions ─────────────────────────────────────────────────

#[tokio::test]
async fn registration_creates_a_verified_user() {
  let f = fixture().await;
  let user = register(&f.store, "  Alice@Example.com ", Role::Editor).await;

  assert_eq!(user.email, "alice@example.com");
  assert_eq!(user.role, Role::Editor);
  assert!(user.verified);

  let creds = f
    .store
    .find_credentials("ALICE@example.com".into())
    .await
    .unwrap()
    .expect("credentials");
  assert_eq!(creds.user, user);
  assert_eq!(creds.password_hash, "$argon2id$stub");
}

#[tokio::test]
async fn second_registration_for_pending_email_conflicts() {
  let f = fixture().await;
  f.store
    .begin_registration("bob@x.com".into(), "h1".into())
    .await
    .unwrap();
  let err = f
    .store
    .begin_registration("BOB@x.com".into(), "h2".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn cancelled_registration_can_start_again() {
  let f = fixture().await;
  f.store
    .begin_registration("dan@x.com".into(), "lost".into())
    .await
    .unwrap();
  f.store.cancel_registration("DAN@x.com".into()).await.unwrap();
  // Cancelling twice is harmless.
  f.store.cancel_registration("dan@x.com".into()).await.unwrap();

  f.store
    .begin_registration("dan@x.com".into(), "otp-hash".into())
    .await
    .unwrap();
  let err = f
    .store
    .complete_registration("lost".into(), NewUser {
      username:      "dan".into(),
      email:         "dan@x.com".into(),
      password_hash: "$argon2id$stub".into(),
      role:          Role::Viewer,
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn cancel_leaves_registered_users_alone() {
  let f = fixture().await;
  register(&f.store, "erin@x.com", Role::Viewer).await;
  f.store.cancel_registration("erin@x.com".into()).await.unwrap();

  let err = f
    .store
    .begin_registration("erin@x.com".into(), "h".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert!(f.store.find_credentials("erin@x.com".into()).await.unwrap().is_some());
}

#[tokio::test]
async fn registering_an_existing_user_conflicts() {
  let f = fixture().await;
  register(&f.store, "carol@x.com", Role::Viewer).await;
  let err = f
    .store
    .begin_registration("carol@x.com".into(), "h".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn wrong_or_missing_code_is_a_validation_error() {
  let f = fixture().await;
  let new_user = |email: &str| NewUser {
    username:      "dave".into(),
    email:         email.into(),
    password_hash: "h".into(),
    role:          Role::Viewer,
  };

  let err = f
    .store
    .complete_registration("anything".into(), new_user("nobody@x.com"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  f.store
    .begin_registration("dave@x.com".into(), "right".into())
    .await
    .unwrap();
  let err = f
    .store
    .complete_registration("wrong".into(), new_user("dave@x.com"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(f.store.find_credentials("dave@x.com".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn set_role_updates_and_rejects_unknown_email() {
  let f = fixture().await;
  let user = register(&f.store, "erin@x.com", Role::Viewer).await;

  let updated = f.store.set_role("Erin@X.com".into(), Role::Admin).await.unwrap();
  assert_eq!(updated.id, user.id);
  assert_eq!(updated.role, Role::Admin);

  let err = f
    .store
    .set_role("ghost@x.com".into(), Role::Admin)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownEmail(_)));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn sessions_resolve_until_expiry_or_logout() {
  let f = fixture().await;
  let user = register(&f.store, "fay@x.com", Role::Viewer).await;
  let now = Utc::now();

  f.store
    .create_session(user.id, "live".into(), now + Duration::hours(1))
    .await
    .unwrap();
  f.store
    .create_session(user.id, "stale".into(), now - Duration::seconds(1))
    .await
    .unwrap();

  let found = f.store.session_user("live".into(), now).await.unwrap();
  assert_eq!(found.map(|u| u.id), Some(user.id));
  assert!(f.store.session_user("stale".into(), now).await.unwrap().is_none());
  assert!(f.store.session_user("unknown".into(), now).await.unwrap().is_none());

  f.store.end_session("live".into()).await.unwrap();
  assert!(f.store.session_user("live".into(), now).await.unwrap().is_none());
}

#[tokio::test]
async fn session_for_unknown_user_is_not_found() {
  let f = fixture().await;
  let err = f
    .store
    .create_session(999, "t".into(), Utc::now() + Duration::hours(1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(999)));
}

// ─── Upload / metadata / download ────────────────────────────────────────────

#[tokio::test]
async fn upload_then_metadata_matches_input() {
  let f = fixture().await;
  let user = register(&f.store, "uploader@x.com", Role::Editor).await;

  let doc = f
    .store
    .upload(new_doc(user.id, "Spec", &["draft", "v1"]))
    .await
    .unwrap();
  let meta = f.store.get_metadata(doc.document_id).await.unwrap();

  assert_eq!(meta.document_id, doc.document_id);
  assert_eq!(meta.title, "Spec");
  assert_eq!(meta.tags, ["draft", "v1"]);
  assert_eq!(meta.permissions, ["a@x.com"]);
  assert_eq!(meta.uploaded_by, "uploader@x.com");
  assert_eq!(meta.last_updated, doc.last_updated);
}

#[tokio::test]
async fn download_is_byte_identical() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;

  let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
  let mut input = new_doc(user.id, "Binary", &[]);
  input.content = content.clone();
  input.filename = "../report final.pdf".into();

  let doc = f.store.upload(input).await.unwrap();
  assert!(f.blobs.exists(&doc.file_path).unwrap());

  let download = f.store.download(doc.document_id).await.unwrap();
  assert_eq!(download.content, content);
  assert_eq!(download.filename, "report final.pdf");
  assert!(doc.file_path.ends_with("_report_final.pdf"));
}

#[tokio::test]
async fn download_returns_the_name_as_uploaded() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;

  let mut input = new_doc(user.id, "CV", &[]);
  input.filename = "résumé 2024.pdf".into();
  let doc = f.store.upload(input).await.unwrap();
  assert_eq!(doc.filename, "résumé 2024.pdf");
  assert!(f.blobs.exists(&doc.file_path).unwrap());

  let download = f.store.download(doc.document_id).await.unwrap();
  assert_eq!(download.filename, "résumé 2024.pdf");
}

#[tokio::test]
async fn upload_by_unknown_user_leaves_nothing_behind() {
  let f = fixture().await;
  let err = f.store.upload(new_doc(42, "Orphan", &[])).await.unwrap_err();
  assert!(matches!(err, Error::UserNotFound(42)));

  let entries = std::fs::read_dir(f.blobs.root()).unwrap().count();
  assert_eq!(entries, 0);
  assert!(f.store.list_documents().await.unwrap().is_empty());
}

/// Accepts nothing: every write fails after recording the path it was given.
#[derive(Clone, Default)]
struct FullDisk {
  attempted: Arc<Mutex<Vec<String>>>,
}

impl BlobStore for FullDisk {
  fn write(&self, path: &str, _data: &[u8]) -> io::Result<()> {
    self.attempted.lock().unwrap().push(path.to_owned());
    Err(io::Error::other("disk full"))
  }

  fn read(&self, _path: &str) -> io::Result<Vec<u8>> {
    Err(io::ErrorKind::NotFound.into())
  }

  fn delete(&self, _path: &str) -> io::Result<()> { Ok(()) }

  fn exists(&self, _path: &str) -> io::Result<bool> { Ok(false) }
}

#[tokio::test]
async fn failed_blob_write_rolls_back_the_row() {
  let blobs = FullDisk::default();
  let store = SqliteStore::open_in_memory(blobs.clone()).await.unwrap();
  let user = register(&store, "u@x.com", Role::Editor).await;

  let err = store
    .upload(new_doc(user.id, "Doomed", &["draft"]))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Storage);
  assert!(matches!(err, Error::Io(_)), "{err}");

  // The id is the prefix of the blob path the store tried to write.
  let path = blobs.attempted.lock().unwrap().pop().expect("a write was attempted");
  let document_id: Uuid = path[..36].parse().unwrap();

  assert!(matches!(
    store.get_metadata(document_id).await,
    Err(Error::DocumentNotFound(id)) if id == document_id
  ));
  assert!(store.list_documents().await.unwrap().is_empty());
  assert!(store.search("draft").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_title_or_tag_is_rejected() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;

  let err = f.store.upload(new_doc(user.id, "   ", &[])).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = f
    .store
    .upload(new_doc(user.id, "Ok", &["fine", " "]))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn missing_document_is_not_found_everywhere() {
  let f = fixture().await;
  let id = Uuid::new_v4();

  let errs = [
    f.store.get_metadata(id).await.unwrap_err(),
    f.store.download(id).await.unwrap_err(),
    f.store.delete(id).await.unwrap_err(),
    f.store.set_tags(id, strings(&["a"])).await.unwrap_err(),
    f.store.set_permissions(id, strings(&["a@x.com"])).await.unwrap_err(),
    f.store
      .update_metadata(id, MetadataEdit::default())
      .await
      .unwrap_err(),
  ];
  for err in errs {
    assert!(matches!(err, Error::DocumentNotFound(got) if got == id), "{err}");
  }
}

#[tokio::test]
async fn download_with_missing_blob_is_not_found() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Gone", &[])).await.unwrap();

  f.blobs.delete(&doc.file_path).unwrap();
  let err = f.store.download(doc.document_id).await.unwrap_err();
  assert!(matches!(err, Error::BlobMissing(_)));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Metadata edits ──────────────────────────────────────────────────────────

#[tokio::test]
async fn set_tags_is_idempotent_and_can_clear() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Tags", &["old"])).await.unwrap();

  f.store.set_tags(doc.document_id, strings(&["b", "a"])).await.unwrap();
  let once = f.store.get_metadata(doc.document_id).await.unwrap().tags;
  f.store.set_tags(doc.document_id, strings(&["b", "a"])).await.unwrap();
  let twice = f.store.get_metadata(doc.document_id).await.unwrap().tags;
  assert_eq!(once, ["a", "b"]);
  assert_eq!(once, twice);

  f.store.set_tags(doc.document_id, vec![]).await.unwrap();
  assert!(f.store.get_metadata(doc.document_id).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn tags_are_shared_between_documents() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let a = f.store.upload(new_doc(user.id, "A", &["shared"])).await.unwrap();
  let b = f.store.upload(new_doc(user.id, "B", &["shared"])).await.unwrap();

  f.store.set_tags(a.document_id, vec![]).await.unwrap();
  let meta_b = f.store.get_metadata(b.document_id).await.unwrap();
  assert_eq!(meta_b.tags, ["shared"]);
}

#[tokio::test]
async fn set_permissions_replaces_the_whole_set() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Perms", &[])).await.unwrap();

  f.store
    .set_permissions(doc.document_id, strings(&["B@x.com", "c@x.com", "b@x.com"]))
    .await
    .unwrap();
  let meta = f.store.get_metadata(doc.document_id).await.unwrap();
  assert_eq!(meta.permissions, ["b@x.com", "c@x.com"]);
}

#[tokio::test]
async fn update_metadata_applies_only_supplied_fields() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f
    .store
    .upload(new_doc(user.id, "Before", &["keep"]))
    .await
    .unwrap();

  let meta = f
    .store
    .update_metadata(doc.document_id, MetadataEdit {
      title:       Some(" After ".into()),
      tags:        None,
      permissions: Some(vec![]),
    })
    .await
    .unwrap();

  assert_eq!(meta.title, "After");
  assert_eq!(meta.tags, ["keep"]);
  assert!(meta.permissions.is_empty());
  assert!(meta.last_updated >= doc.last_updated);
  assert_eq!(f.store.get_metadata(doc.document_id).await.unwrap(), meta);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_keeps_logs_and_comments() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f
    .store
    .upload(new_doc(user.id, "Doomed", &["tmp"]))
    .await
    .unwrap();

  f.store
    .add_comment(NewComment {
      document_id:  doc.document_id,
      user_email:   "u@x.com".into(),
      comment_text: "first".into(),
    })
    .await
    .unwrap();
  f.store
    .record_activity(NewActivity {
      user_id:     user.id,
      action:      "upload".into(),
      document_id: Some(doc.document_id),
      timestamp:   "2024-01-01 10:00:00".into(),
    })
    .await
    .unwrap();

  f.store.delete(doc.document_id).await.unwrap();

  assert!(matches!(
    f.store.get_metadata(doc.document_id).await,
    Err(Error::DocumentNotFound(_))
  ));
  assert!(f.store.search("Doomed").await.unwrap().is_empty());
  assert!(!f.blobs.exists(&doc.file_path).unwrap());

  let comments = f.store.comments_for(doc.document_id).await.unwrap();
  assert_eq!(comments.len(), 1);

  let logs = f.store.activity_for_user(user.id).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].document_id, Some(doc.document_id));
  assert_eq!(logs[0].document_title, None);
}

#[tokio::test]
async fn delete_tolerates_a_missing_blob() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Half", &[])).await.unwrap();

  f.blobs.delete(&doc.file_path).unwrap();
  f.store.delete(doc.document_id).await.unwrap();
  assert!(f.store.get_metadata(doc.document_id).await.is_err());
}

// ─── Listing & search ────────────────────────────────────────────────────────

#[tokio::test]
async fn list_documents_includes_tags_and_comments() {
  let f = fixture().await;
  let user = register(&f.store, "lister@x.com", Role::Editor).await;
  let b = f.store.upload(new_doc(user.id, "Beta", &["y"])).await.unwrap();
  f.store.upload(new_doc(user.id, "Alpha", &["x"])).await.unwrap();
  f.store
    .add_comment(NewComment {
      document_id:  b.document_id,
      user_email:   "lister@x.com".into(),
      comment_text: "looks good".into(),
    })
    .await
    .unwrap();

  let docs = f.store.list_documents().await.unwrap();
  let titles: Vec<_> = docs.iter().map(|d| d.title.as_str()).collect();
  assert_eq!(titles, ["Alpha", "Beta"]);
  assert_eq!(docs[1].tags, ["y"]);
  assert_eq!(docs[1].uploaded_by, "lister@x.com");
  assert_eq!(docs[1].comments.len(), 1);
  assert_eq!(docs[1].comments[0].comment_text, "looks good");
}

#[tokio::test]
async fn search_matches_title_tag_and_uploader() {
  let f = fixture().await;
  let alice = register(&f.store, "alice@x.com", Role::Editor).await;
  let bob = register(&f.store, "bob@y.org", Role::Editor).await;

  let report = f
    .store
    .upload(new_doc(alice.id, "Quarterly Report", &["finance", "q1"]))
    .await
    .unwrap();
  let memo = f
    .store
    .upload(new_doc(bob.id, "Memo", &["Internal"]))
    .await
    .unwrap();

  let by_title = f.store.search("report").await.unwrap();
  assert_eq!(by_title.len(), 1);
  assert_eq!(by_title[0].document_id, report.document_id);
  assert_eq!(by_title[0].tags, "finance,q1");
  assert_eq!(by_title[0].uploaded_by, "alice@x.com");

  let by_tag = f.store.search("INTERNAL").await.unwrap();
  assert_eq!(by_tag.len(), 1);
  assert_eq!(by_tag[0].document_id, memo.document_id);

  let by_email = f.store.search("y.org").await.unwrap();
  assert_eq!(by_email.len(), 1);
  assert_eq!(by_email[0].title, "Memo");
}

#[tokio::test]
async fn search_returns_each_document_once_in_title_order() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  f.store
    .upload(new_doc(user.id, "Zeta plan", &["plan", "planning"]))
    .await
    .unwrap();
  f.store.upload(new_doc(user.id, "Alpha plan", &[])).await.unwrap();

  let hits = f.store.search("plan").await.unwrap();
  let titles: Vec<_> = hits.iter().map(|h| h.title.as_str()).collect();
  assert_eq!(titles, ["Alpha plan", "Zeta plan"]);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  f.store.upload(new_doc(user.id, "100% done", &[])).await.unwrap();
  f.store.upload(new_doc(user.id, "100 items", &[])).await.unwrap();

  let hits = f.store.search("100%").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].title, "100% done");

  assert!(f.store.search("_").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_query_is_invalid_and_no_match_is_empty() {
  let f = fixture().await;
  let err = f.store.search("  ").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  assert!(f.store.search("nomatch_xyz").await.unwrap().is_empty());
}

// ─── Activity log ────────────────────────────────────────────────────────────

#[tokio::test]
async fn recorded_activity_is_listed_for_its_user() {
  let f = fixture().await;
  let id = Uuid::new_v4();

  let entry = f
    .store
    .record_activity(NewActivity {
      user_id:     7,
      action:      "upload".into(),
      document_id: Some(id),
      timestamp:   "2024-01-01 10:00:00".into(),
    })
    .await
    .unwrap();

  let logs = f.store.activity_for_user(7).await.unwrap();
  assert_eq!(logs, [entry.clone()]);
  assert_eq!(entry.action, "upload");
  assert_eq!(entry.document_id, Some(id));
  assert_eq!(entry.username, None);
  assert!(f.store.activity_for_user(8).await.unwrap().is_empty());
}

#[tokio::test]
async fn activity_is_ordered_by_timestamp_and_resolves_names() {
  let f = fixture().await;
  let user = register(&f.store, "gus@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Ledger", &[])).await.unwrap();

  for (action, ts) in [("edit", "2024-03-01 09:00:00"), ("upload", "2024-02-01 09:00:00")] {
    f.store
      .record_activity(NewActivity {
        user_id:     user.id,
        action:      action.into(),
        document_id: Some(doc.document_id),
        timestamp:   ts.into(),
      })
      .await
      .unwrap();
  }
  f.store
    .record_activity(NewActivity {
      user_id:     99,
      action:      "login".into(),
      document_id: None,
      timestamp:   "2024-01-15 09:00:00".into(),
    })
    .await
    .unwrap();

  let all = f.store.all_activity().await.unwrap();
  let actions: Vec<_> = all.iter().map(|e| e.action.as_str()).collect();
  assert_eq!(actions, ["login", "upload", "edit"]);
  assert_eq!(all[1].username.as_deref(), Some("gus"));
  assert_eq!(all[1].document_title.as_deref(), Some("Ledger"));
  assert_eq!(all[0].username, None);
}

#[tokio::test]
async fn malformed_activity_is_rejected() {
  let f = fixture().await;
  let bad_ts = NewActivity {
    user_id:     1,
    action:      "upload".into(),
    document_id: None,
    timestamp:   "2024-01-01T10:00:00Z".into(),
  };
  let err = f.store.record_activity(bad_ts.clone()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let blank_action = NewActivity {
    action: "  ".into(),
    timestamp: "2024-01-01 10:00:00".into(),
    ..bad_ts
  };
  let err = f.store.record_activity(blank_action).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(f.store.all_activity().await.unwrap().is_empty());
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_are_appended_in_order() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Viewer).await;
  let editor = register(&f.store, "e@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(editor.id, "Thread", &[])).await.unwrap();

  let first = f
    .store
    .add_comment(NewComment {
      document_id:  doc.document_id,
      user_email:   user.email.clone(),
      comment_text: " first ".into(),
    })
    .await
    .unwrap();
  let second = f
    .store
    .add_comment(NewComment {
      document_id:  doc.document_id,
      user_email:   "E@x.com".into(),
      comment_text: "second".into(),
    })
    .await
    .unwrap();

  assert_eq!(first.comment_text, "first");
  assert_eq!(second.user_email, "e@x.com");
  let thread = f.store.comments_for(doc.document_id).await.unwrap();
  assert_eq!(thread, [first, second]);
}

#[tokio::test]
async fn comment_requires_an_existing_document_and_text() {
  let f = fixture().await;
  let user = register(&f.store, "u@x.com", Role::Editor).await;
  let doc = f.store.upload(new_doc(user.id, "Doc", &[])).await.unwrap();

  let err = f
    .store
    .add_comment(NewComment {
      document_id:  Uuid::new_v4(),
      user_email:   "u@x.com".into(),
      comment_text: "hello".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DocumentNotFound(_)));

  let err = f
    .store
    .add_comment(NewComment {
      document_id:  doc.document_id,
      user_email:   "u@x.com".into(),
      comment_text: "   ".into(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_backed_store_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let db_path = dir.path().join("docket.db");
  let blobs = FsBlobStore::open(dir.path().join("uploads")).unwrap();

  let doc_id = {
    let s = SqliteStore::open(&db_path, blobs.clone()).await.unwrap();
    let user = register(&s, "p@x.com", Role::Admin).await;
    s.upload(new_doc(user.id, "Persistent", &["keep"]))
      .await
      .unwrap()
      .document_id
  };

  let s = SqliteStore::open(&db_path, blobs).await.unwrap();
  let meta = s.get_metadata(doc_id).await.unwrap();
  assert_eq!(meta.title, "Persistent");
  assert_eq!(s.download(doc_id).await.unwrap().content, b"hello docket");
}
