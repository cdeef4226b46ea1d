//! Error type for `kin-store-sqlite`.

use kin_core::MergeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("merge error: {0}")]
  Merge(#[from] MergeError),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Raised inside a merge transaction, where the connection is used
  /// directly rather than through the async wrapper.
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A family row whose parent columns disagree with its body.
  #[error("family {0} has inconsistent parent columns")]
  CorruptFamily(uuid::Uuid),
}

impl Error {
  /// `true` when the merge was refused because of how the two persons are
  /// related, rather than because of a storage problem.
  pub fn is_precondition(&self) -> bool {
    matches!(self, Self::Merge(e) if e.is_precondition())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
