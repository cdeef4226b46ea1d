//! Opaque record identifiers.
//!
//! Every record kind gets its own newtype so a family identifier can never be
//! passed where a person identifier is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! record_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub Uuid);

    impl $name {
      /// Mint a fresh random identifier.
      pub fn new() -> Self { Self(Uuid::new_v4()) }

      pub fn as_uuid(&self) -> Uuid { self.0 }
    }

    impl Default for $name {
      fn default() -> Self { Self::new() }
    }

    impl From<Uuid> for $name {
      fn from(id: Uuid) -> Self { Self(id) }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
      }
    }
  };
}

record_id!(
  /// Identifies a [`Person`](crate::person::Person).
  PersonId
);
record_id!(
  /// Identifies a [`Family`](crate::family::Family).
  FamilyId
);
record_id!(
  /// Identifies an event record. Events are never mutated by a merge.
  EventId
);
record_id!(
  /// Identifies a source record referenced by citations.
  SourceId
);
record_id!(
  /// Identifies a media object.
  MediaId
);

/// Either kind of record the merge engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordId {
  Person(PersonId),
  Family(FamilyId),
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Person(id) => write!(f, "person {id}"),
      Self::Family(id) => write!(f, "family {id}"),
    }
  }
}

impl From<PersonId> for RecordId {
  fn from(id: PersonId) -> Self { Self::Person(id) }
}

impl From<FamilyId> for RecordId {
  fn from(id: FamilyId) -> Self { Self::Family(id) }
}
