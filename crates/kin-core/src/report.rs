//! The structured result of a merge, for display and undo logging.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  id::{FamilyId, PersonId},
  staging::ChangeSet,
};

/// Whether the target of a family-pair merge already belonged to the
/// survivor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLink {
  /// The target was already one of the survivor's spouse families.
  Existing,
  /// The target was linked to the survivor by this merge.
  Added,
}

/// A source family dissolved into an equivalent target family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMerge {
  pub source: FamilyId,
  pub target: FamilyId,
  pub link:   TargetLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
  /// The person that absorbed the other.
  pub survivor:           PersonId,
  /// The person that was deleted.
  pub removed:            PersonId,
  pub merged_families:    Vec<FamilyMerge>,
  /// Families kept in place with the removed person's slot rewritten.
  pub rewritten_families: BTreeSet<FamilyId>,
  /// Families deleted for having neither parents nor children.
  pub orphaned_families:  BTreeSet<FamilyId>,
  /// Every family written by the merge.
  pub updated_families:   BTreeSet<FamilyId>,
  /// Every person written by the merge, the survivor excluded.
  pub updated_persons:    BTreeSet<PersonId>,
}

impl MergeReport {
  pub fn new(survivor: PersonId, removed: PersonId) -> Self {
    Self {
      survivor,
      removed,
      merged_families: Vec::new(),
      rewritten_families: BTreeSet::new(),
      orphaned_families: BTreeSet::new(),
      updated_families: BTreeSet::new(),
      updated_persons: BTreeSet::new(),
    }
  }

  /// Fill in the written-record sets from the final change set.
  pub(crate) fn record_changes(&mut self, changes: &ChangeSet) {
    self.updated_families = changes.families.iter().map(|f| f.id).collect();
    self.updated_persons = changes
      .persons
      .iter()
      .map(|p| p.id)
      .filter(|id| *id != self.survivor)
      .collect();
  }

  /// Families merged away plus families deleted as orphans.
  pub fn deleted_families(&self) -> BTreeSet<FamilyId> {
    self
      .merged_families
      .iter()
      .map(|m| m.source)
      .chain(self.orphaned_families.iter().copied())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serializes_with_snake_case_links() {
    let (survivor, removed) = (PersonId::new(), PersonId::new());
    let (source, target) = (FamilyId::new(), FamilyId::new());
    let mut report = MergeReport::new(survivor, removed);
    report.merged_families.push(FamilyMerge { source, target, link: TargetLink::Added });
    report.orphaned_families.insert(FamilyId::new());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["survivor"], survivor.to_string());
    assert_eq!(json["merged_families"][0]["link"], "added");

    let back: MergeReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
    assert_eq!(back.deleted_families().len(), 2);
  }
}
