//! Error types for `kin-core`.

use thiserror::Error;

use crate::id::{PersonId, RecordId};

/// Boxed error raised by a store backend.
pub type StoreCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum MergeError {
  #[error("cannot merge {0} with itself")]
  SamePerson(PersonId),

  #[error("spouses cannot be merged")]
  SpousesCannotMerge,

  #[error("a parent and their child cannot be merged")]
  ParentChildCannotMerge,

  #[error("a person and their ancestor cannot be merged")]
  AncestorCannotMerge,

  #[error("record not found: {0}")]
  RecordNotFound(RecordId),

  #[error("store read failed: {0}")]
  StoreReadFailed(#[source] StoreCause),

  #[error("store write failed: {0}")]
  StoreWriteFailed(#[source] StoreCause),

  #[error("invariant violated: {0}")]
  InvariantViolation(String),
}

impl MergeError {
  /// `true` for rejections detected before anything was read for writing;
  /// the caller can recover by choosing a different pair.
  pub fn is_precondition(&self) -> bool {
    matches!(
      self,
      Self::SamePerson(_)
        | Self::SpousesCannotMerge
        | Self::ParentChildCannotMerge
        | Self::AncestorCannotMerge
    )
  }

  pub(crate) fn read<E>(cause: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreReadFailed(Box::new(cause))
  }

  pub(crate) fn write<E>(cause: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreWriteFailed(Box::new(cause))
  }
}

pub type Result<T, E = MergeError> = std::result::Result<T, E>;
