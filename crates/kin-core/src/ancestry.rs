//! Reachability over parent-family links.
//!
//! Walks upward from a person through the families they are a child in,
//! breadth first, with an explicit queue and visited sets so cycles already
//! present in the data cannot make the walk run forever.

use std::collections::{BTreeSet, VecDeque};

use crate::{
  MergeError, Result,
  id::{FamilyId, PersonId},
  store::StoreTxn,
};

/// `true` if `ancestor` is a parent, grandparent, … of `person`.
///
/// Dangling identifiers are skipped: they cannot lead anywhere.
pub fn is_ancestor<T: StoreTxn>(
  txn: &T,
  ancestor: PersonId,
  person: PersonId,
) -> Result<bool> {
  let mut queue = VecDeque::from([person]);
  let mut seen_persons = BTreeSet::from([person]);
  let mut seen_families = BTreeSet::<FamilyId>::new();

  while let Some(id) = queue.pop_front() {
    let Some(current) = txn.get_person(id).map_err(MergeError::read)? else {
      continue;
    };
    for family_id in current.parent_families {
      if !seen_families.insert(family_id) {
        continue;
      }
      let Some(family) = txn.get_family(family_id).map_err(MergeError::read)?
      else {
        continue;
      };
      for parent in [family.father, family.mother].into_iter().flatten() {
        if parent == ancestor {
          return Ok(true);
        }
        if seen_persons.insert(parent) {
          queue.push_back(parent);
        }
      }
    }
  }
  Ok(false)
}

/// Fails with [`MergeError::AncestorCannotMerge`] if either person descends
/// from the other.
pub fn check_unrelated_by_descent<T: StoreTxn>(
  txn: &T,
  a: PersonId,
  b: PersonId,
) -> Result<()> {
  if is_ancestor(txn, a, b)? || is_ancestor(txn, b, a)? {
    return Err(MergeError::AncestorCannotMerge);
  }
  Ok(())
}
