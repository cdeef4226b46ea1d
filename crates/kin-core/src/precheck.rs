//! Conflict pre-check: rejects pairs whose merge would break the graph.
//!
//! Pure; looks only at the back-reference sets of the two persons.

use crate::{MergeError, Result, person::Person};

/// Fails with [`MergeError::SpousesCannotMerge`] when the two share a spouse
/// family, or [`MergeError::ParentChildCannotMerge`] when one is a child in a
/// family where the other is a parent.
pub fn precheck(primary: &Person, secondary: &Person) -> Result<()> {
  if primary.id == secondary.id {
    return Err(MergeError::SamePerson(primary.id));
  }

  if !primary.spouse_families.is_disjoint(&secondary.spouse_families) {
    return Err(MergeError::SpousesCannotMerge);
  }

  if !secondary.spouse_families.is_disjoint(&primary.parent_families)
    || !primary.spouse_families.is_disjoint(&secondary.parent_families)
  {
    return Err(MergeError::ParentChildCannotMerge);
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{id::FamilyId, person::Name};

  fn pair() -> (Person, Person) {
    (
      Person::new("I1", Name::new("Ann", "Lee")),
      Person::new("I2", Name::new("Anne", "Lee")),
    )
  }

  #[test]
  fn unrelated_pair_passes() {
    let (mut a, mut b) = pair();
    a.spouse_families.insert(FamilyId::new());
    b.parent_families.insert(FamilyId::new());
    assert!(precheck(&a, &b).is_ok());
  }

  #[test]
  fn shared_spouse_family_is_rejected() {
    let (mut a, mut b) = pair();
    let f = FamilyId::new();
    a.spouse_families.insert(f);
    b.spouse_families.insert(f);
    assert!(matches!(precheck(&a, &b), Err(MergeError::SpousesCannotMerge)));
  }

  #[test]
  fn parent_and_child_are_rejected_both_ways() {
    let (mut a, mut b) = pair();
    let f = FamilyId::new();
    a.spouse_families.insert(f);
    b.parent_families.insert(f);
    assert!(matches!(precheck(&a, &b), Err(MergeError::ParentChildCannotMerge)));
    assert!(matches!(precheck(&b, &a), Err(MergeError::ParentChildCannotMerge)));
  }

  #[test]
  fn siblings_may_merge() {
    let (mut a, mut b) = pair();
    let f = FamilyId::new();
    a.parent_families.insert(f);
    b.parent_families.insert(f);
    assert!(precheck(&a, &b).is_ok());
  }

  #[test]
  fn self_merge_is_rejected() {
    let (a, _) = pair();
    assert!(matches!(precheck(&a, &a), Err(MergeError::SamePerson(_))));
  }
}
