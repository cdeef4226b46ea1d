//! The `RecordStore` and `StoreTxn` traits.
//!
//! The merge engine never talks to a database directly. It is handed a store,
//! opens one transaction on it, and performs every read and write of a merge
//! through that transaction. Backends (`kin-store-sqlite`, the in-memory
//! [`MemoryStore`](crate::memory::MemoryStore)) implement these traits.

use crate::{
  family::Family,
  id::{FamilyId, PersonId},
  person::Person,
};

/// A store of person and family records that can open transactions.
pub trait RecordStore {
  type Error: std::error::Error + Send + Sync + 'static;

  type Txn<'a>: StoreTxn<Error = Self::Error>
  where
    Self: 'a;

  /// Open a transaction. Dropping it without calling [`StoreTxn::commit`]
  /// discards every write made through it.
  fn transaction_begin(&mut self) -> Result<Self::Txn<'_>, Self::Error>;
}

/// One open transaction. Reads observe the transaction's own writes.
pub trait StoreTxn {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Returns `None` if no person has this identifier.
  fn get_person(&self, id: PersonId) -> Result<Option<Person>, Self::Error>;

  /// Returns `None` if no family has this identifier.
  fn get_family(&self, id: FamilyId) -> Result<Option<Family>, Self::Error>;

  /// Every family whose father slot equals `father` and whose mother slot
  /// equals `mother`. `None` matches only an empty slot.
  fn find_families_by_parents(
    &self,
    father: Option<PersonId>,
    mother: Option<PersonId>,
  ) -> Result<Vec<FamilyId>, Self::Error>;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or replace a person.
  fn commit_person(&mut self, person: &Person) -> Result<(), Self::Error>;

  fn remove_person(&mut self, id: PersonId) -> Result<(), Self::Error>;

  /// Insert or replace a family.
  fn commit_family(&mut self, family: &Family) -> Result<(), Self::Error>;

  fn remove_family(&mut self, id: FamilyId) -> Result<(), Self::Error>;

  /// Make every write durable. `description` is a human-readable label for
  /// the change, kept by backends that journal their commits.
  fn commit(self, description: &str) -> Result<(), Self::Error>;
}
