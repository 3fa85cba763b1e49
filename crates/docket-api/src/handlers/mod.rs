//! Route handlers, one module per resource.

pub mod account;
pub mod assist;
pub mod comments;
pub mod documents;
pub mod logs;
pub mod search;

use chrono::Utc;
use docket_core::{
  activity::{NewActivity, format_timestamp},
  store::DocumentStore,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::CurrentUser;

/// Append an activity entry stamped with the server clock.
///
/// The action itself has already happened, so a failure here is logged and
/// swallowed rather than turned into an error response.
pub(crate) async fn record<S: DocumentStore>(
  store:       &S,
  user:        &CurrentUser,
  action:      &str,
  document_id: Uuid,
) {
  let entry = NewActivity {
    user_id:     user.user_id,
    action:      action.to_owned(),
    document_id: Some(document_id),
    timestamp:   format_timestamp(Utc::now().naive_utc()),
  };
  if let Err(e) = store.record_activity(entry).await {
    warn!(user_id = user.user_id, %action, %document_id, error = %e, "activity: not recorded");
  }
}
