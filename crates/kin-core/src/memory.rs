//! An in-memory [`RecordStore`], for tests and for callers that want to
//! exercise the engine without a database.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
  family::Family,
  id::{FamilyId, PersonId},
  person::Person,
  store::{RecordStore, StoreTxn},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  /// Raised by the write that exceeded the budget set with
  /// [`MemoryStore::fail_writes_after`].
  #[error("injected failure on write #{0}")]
  Injected(usize),
}

/// The full contents of a [`MemoryStore`] at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
  pub persons:  BTreeMap<PersonId, Person>,
  pub families: BTreeMap<FamilyId, Family>,
}

/// A store held in two ordered maps.
///
/// Transactions work on a private copy and swap it in on commit, so a dropped
/// transaction leaves the store untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  data:       Snapshot,
  fail_after: Option<usize>,
  commits:    Vec<String>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Insert or replace a person outside of any transaction.
  pub fn put_person(&mut self, person: Person) {
    self.data.persons.insert(person.id, person);
  }

  /// Insert or replace a family outside of any transaction.
  pub fn put_family(&mut self, family: Family) {
    self.data.families.insert(family.id, family);
  }

  pub fn person(&self, id: PersonId) -> Option<&Person> {
    self.data.persons.get(&id)
  }

  pub fn family(&self, id: FamilyId) -> Option<&Family> {
    self.data.families.get(&id)
  }

  pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
    self.data.persons.get_mut(&id)
  }

  pub fn family_mut(&mut self, id: FamilyId) -> Option<&mut Family> {
    self.data.families.get_mut(&id)
  }

  pub fn persons(&self) -> impl Iterator<Item = &Person> {
    self.data.persons.values()
  }

  pub fn families(&self) -> impl Iterator<Item = &Family> {
    self.data.families.values()
  }

  pub fn snapshot(&self) -> Snapshot { self.data.clone() }

  /// Descriptions of every committed transaction, oldest first.
  pub fn commits(&self) -> &[String] { &self.commits }

  /// Let the next `n` writes of each transaction succeed and fail the one
  /// after. Writes include removals and the final commit.
  pub fn fail_writes_after(&mut self, n: usize) {
    self.fail_after = Some(n);
  }

  pub fn clear_failures(&mut self) { self.fail_after = None; }
}

impl RecordStore for MemoryStore {
  type Error = MemoryError;
  type Txn<'a>
    = MemoryTxn<'a>
  where
    Self: 'a;

  fn transaction_begin(&mut self) -> Result<MemoryTxn<'_>, MemoryError> {
    Ok(MemoryTxn { work: self.data.clone(), writes: 0, store: self })
  }
}

/// A transaction on a [`MemoryStore`].
pub struct MemoryTxn<'a> {
  store:  &'a mut MemoryStore,
  work:   Snapshot,
  writes: usize,
}

impl MemoryTxn<'_> {
  fn count_write(&mut self) -> Result<(), MemoryError> {
    self.writes += 1;
    match self.store.fail_after {
      Some(limit) if self.writes > limit => Err(MemoryError::Injected(self.writes)),
      _ => Ok(()),
    }
  }
}

impl StoreTxn for MemoryTxn<'_> {
  type Error = MemoryError;

  fn get_person(&self, id: PersonId) -> Result<Option<Person>, MemoryError> {
    Ok(self.work.persons.get(&id).cloned())
  }

  fn get_family(&self, id: FamilyId) -> Result<Option<Family>, MemoryError> {
    Ok(self.work.families.get(&id).cloned())
  }

  fn find_families_by_parents(
    &self,
    father: Option<PersonId>,
    mother: Option<PersonId>,
  ) -> Result<Vec<FamilyId>, MemoryError> {
    Ok(
      self
        .work
        .families
        .values()
        .filter(|f| f.father == father && f.mother == mother)
        .map(|f| f.id)
        .collect(),
    )
  }

  fn commit_person(&mut self, person: &Person) -> Result<(), MemoryError> {
    self.count_write()?;
    self.work.persons.insert(person.id, person.clone());
    Ok(())
  }

  fn remove_person(&mut self, id: PersonId) -> Result<(), MemoryError> {
    self.count_write()?;
    self.work.persons.remove(&id);
    Ok(())
  }

  fn commit_family(&mut self, family: &Family) -> Result<(), MemoryError> {
    self.count_write()?;
    self.work.families.insert(family.id, family.clone());
    Ok(())
  }

  fn remove_family(&mut self, id: FamilyId) -> Result<(), MemoryError> {
    self.count_write()?;
    self.work.families.remove(&id);
    Ok(())
  }

  fn commit(mut self, description: &str) -> Result<(), MemoryError> {
    self.count_write()?;
    self.store.data = std::mem::take(&mut self.work);
    self.store.commits.push(description.to_owned());
    Ok(())
  }
}
