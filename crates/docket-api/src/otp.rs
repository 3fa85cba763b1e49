//! One-time verification codes for registration.

use rand_core::{OsRng, RngCore};
use tracing::info;

use crate::auth::sha256_hex;

pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Delivers a freshly issued code to the address being registered.
pub trait OtpSender: Send + Sync + 'static {
  fn send(&self, email: &str, code: &str) -> Result<(), SendError>;
}

/// Writes codes to the log instead of sending mail. Suitable for development
/// and for deployments that ship logs to an operator.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

impl OtpSender for LogOtpSender {
  fn send(&self, email: &str, code: &str) -> Result<(), SendError> {
    info!(%email, %code, "verification code issued");
    Ok(())
  }
}

/// A uniformly random six-digit code (`100000..=999999`).
pub fn generate_code() -> String {
  let n = 100_000 + OsRng.next_u32() % 900_000;
  n.to_string()
}

/// Digest stored in place of the code. Surrounding whitespace is ignored.
pub fn hash_code(code: &str) -> String { sha256_hex(code.trim()) }
