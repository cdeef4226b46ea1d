//! Staging arena for one merge.
//!
//! Records are loaded from the transaction on first use and kept in ordered
//! maps keyed by identifier. Every mutation lands here first; the store sees
//! nothing until the arena is turned into a [`ChangeSet`] and applied. Lookups
//! that the store answers (parent-pair equivalence) are overlaid with the
//! staged edits so the engine always reasons about its own pending state.

use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use crate::{
  MergeError, Result,
  family::Family,
  id::{FamilyId, PersonId, RecordId},
  person::Person,
  store::StoreTxn,
};

// ─── Slots ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Slot<R> {
  /// Loaded and unchanged.
  Clean(R),
  /// Changed; will be committed.
  Dirty(R),
  /// Will be removed.
  Removed,
}

impl<R> Slot<R> {
  fn get(&self) -> Option<&R> {
    match self {
      Slot::Clean(r) | Slot::Dirty(r) => Some(r),
      Slot::Removed => None,
    }
  }
}

// ─── Arena ───────────────────────────────────────────────────────────────────

pub struct Staging<'t, T: StoreTxn> {
  txn:      &'t T,
  persons:  BTreeMap<PersonId, Slot<Person>>,
  families: BTreeMap<FamilyId, Slot<Family>>,
  /// Families the merge looked at closely enough to owe an orphan check.
  touched:  BTreeSet<FamilyId>,
}

impl<'t, T: StoreTxn> Staging<'t, T> {
  pub fn new(txn: &'t T) -> Self {
    Self {
      txn,
      persons: BTreeMap::new(),
      families: BTreeMap::new(),
      touched: BTreeSet::new(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The staged (or stored) person. Missing and removed persons are both
  /// [`MergeError::RecordNotFound`].
  pub fn person(&mut self, id: PersonId) -> Result<&Person> {
    self
      .find_person(id)?
      .ok_or(MergeError::RecordNotFound(RecordId::Person(id)))
  }

  /// Like [`Staging::person`] but tolerant of absence.
  pub fn find_person(&mut self, id: PersonId) -> Result<Option<&Person>> {
    let slot = match self.persons.entry(id) {
      Entry::Occupied(e) => e.into_mut(),
      Entry::Vacant(e) => {
        match self.txn.get_person(id).map_err(MergeError::read)? {
          Some(p) => e.insert(Slot::Clean(p)),
          None => return Ok(None),
        }
      }
    };
    Ok(slot.get())
  }

  pub fn family(&mut self, id: FamilyId) -> Result<&Family> {
    let slot = match self.families.entry(id) {
      Entry::Occupied(e) => e.into_mut(),
      Entry::Vacant(e) => {
        let family = self
          .txn
          .get_family(id)
          .map_err(MergeError::read)?
          .ok_or(MergeError::RecordNotFound(RecordId::Family(id)))?;
        e.insert(Slot::Clean(family))
      }
    };
    slot.get().ok_or(MergeError::RecordNotFound(RecordId::Family(id)))
  }

  /// The family, other than `exclude`, whose father and mother slots equal
  /// the given pair once staged edits are taken into account.
  pub fn find_family_by_parents(
    &self,
    father: Option<PersonId>,
    mother: Option<PersonId>,
    exclude: FamilyId,
  ) -> Result<Option<FamilyId>> {
    let staged = self
      .families
      .iter()
      .filter(|(id, _)| **id != exclude)
      .find_map(|(id, slot)| {
        slot.get().filter(|f| f.parents() == (father, mother)).map(|_| *id)
      });
    if staged.is_some() {
      return Ok(staged);
    }

    // Anything staged was checked above (or is being removed) and shadows
    // the stored copy.
    let stored = self
      .txn
      .find_families_by_parents(father, mother)
      .map_err(MergeError::read)?;
    Ok(
      stored
        .into_iter()
        .find(|id| *id != exclude && !self.families.contains_key(id)),
    )
  }

  // ── Writes ────────────────────────────────────────────────────────────

  pub fn put_person(&mut self, person: Person) {
    self.persons.insert(person.id, Slot::Dirty(person));
  }

  pub fn put_family(&mut self, family: Family) {
    self.touched.insert(family.id);
    self.families.insert(family.id, Slot::Dirty(family));
  }

  pub fn remove_person(&mut self, id: PersonId) {
    self.persons.insert(id, Slot::Removed);
  }

  pub fn remove_family(&mut self, id: FamilyId) {
    self.touched.remove(&id);
    self.families.insert(id, Slot::Removed);
  }

  /// Queue `id` for an orphan check without changing it.
  pub fn touch_family(&mut self, id: FamilyId) { self.touched.insert(id); }

  /// Families queued for an orphan check that are still staged for keeping.
  pub fn touched_families(&self) -> Vec<FamilyId> {
    self.touched.iter().copied().collect()
  }

  /// Strip `family` from the back-reference sets of every staged person.
  pub fn forget_family_everywhere(&mut self, family: FamilyId) {
    for slot in self.persons.values_mut() {
      let changed = match slot {
        Slot::Clean(p) | Slot::Dirty(p) => p.forget_family(family),
        Slot::Removed => false,
      };
      if changed {
        *slot = match std::mem::replace(slot, Slot::Removed) {
          Slot::Clean(p) | Slot::Dirty(p) => Slot::Dirty(p),
          Slot::Removed => Slot::Removed,
        };
      }
    }
  }

  // ── Finish ────────────────────────────────────────────────────────────

  /// Verify the staged state and turn it into the writes it implies.
  pub fn into_changes(self) -> Result<ChangeSet> {
    let mut changes = ChangeSet::default();

    for (id, slot) in self.families {
      match slot {
        Slot::Dirty(family) => {
          if family.father.is_some() && family.father == family.mother {
            return Err(MergeError::InvariantViolation(format!(
              "family {id} would name the same person as father and mother"
            )));
          }
          changes.families.push(family);
        }
        Slot::Removed => changes.removed_families.push(id),
        Slot::Clean(_) => {}
      }
    }

    for (id, slot) in self.persons {
      match slot {
        Slot::Dirty(person) => changes.persons.push(person),
        Slot::Removed => changes.removed_persons.push(id),
        Slot::Clean(_) => {}
      }
    }

    changes.check_links()?;
    Ok(changes)
  }
}

// ─── ChangeSet ───────────────────────────────────────────────────────────────

/// Every write a merge needs, ready to apply to a transaction.
#[derive(Debug, Default)]
pub struct ChangeSet {
  pub persons:          Vec<Person>,
  pub families:         Vec<Family>,
  pub removed_persons:  Vec<PersonId>,
  pub removed_families: Vec<FamilyId>,
}

impl ChangeSet {
  /// Commit every record, then perform every removal.
  pub fn apply<T: StoreTxn>(&self, txn: &mut T) -> Result<()> {
    for person in &self.persons {
      txn.commit_person(person).map_err(MergeError::write)?;
    }
    for family in &self.families {
      txn.commit_family(family).map_err(MergeError::write)?;
    }
    for id in &self.removed_persons {
      txn.remove_person(*id).map_err(MergeError::write)?;
    }
    for id in &self.removed_families {
      txn.remove_family(*id).map_err(MergeError::write)?;
    }
    Ok(())
  }

  /// Back-references among the records being written must agree with each
  /// other, and nothing written may point at a removed record.
  fn check_links(&self) -> Result<()> {
    let removed_people: BTreeSet<_> = self.removed_persons.iter().collect();
    let removed_families: BTreeSet<_> = self.removed_families.iter().collect();
    let violation = |msg: String| Err(MergeError::InvariantViolation(msg));

    for person in &self.persons {
      let linked = person.spouse_families.iter().chain(&person.parent_families);
      if let Some(f) = linked.into_iter().find(|f| removed_families.contains(f)) {
        return violation(format!("person {} still links removed family {f}", person.id));
      }
    }

    for family in &self.families {
      let members = [family.father, family.mother]
        .into_iter()
        .flatten()
        .chain(family.children.iter().map(|c| c.child));
      if let Some(p) = members.into_iter().find(|p| removed_people.contains(p)) {
        return violation(format!("family {} still names removed person {p}", family.id));
      }

      for parent in [family.father, family.mother].into_iter().flatten() {
        if let Some(p) = self.persons.iter().find(|p| p.id == parent)
          && !p.spouse_families.contains(&family.id)
        {
          return violation(format!(
            "family {} names {parent} as a parent without a back-reference",
            family.id
          ));
        }
      }
      for child in &family.children {
        if let Some(p) = self.persons.iter().find(|p| p.id == child.child)
          && !p.parent_families.contains(&family.id)
        {
          return violation(format!(
            "family {} names {} as a child without a back-reference",
            family.id, child.child
          ));
        }
      }
    }
    Ok(())
  }
}
