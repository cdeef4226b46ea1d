//! The merge entry point.
//!
//! A merge plans every write inside a staging arena, applies the resulting
//! change set to one transaction, and commits. Any error before the commit
//! drops the transaction, which rolls it back.

use tracing::{debug, info};

use crate::{
  MergeError, Result,
  ancestry::check_unrelated_by_descent,
  fields::merge_person_fields,
  id::PersonId,
  precheck::precheck,
  reconcile::reconcile,
  report::MergeReport,
  staging::{ChangeSet, Staging},
  store::{RecordStore, StoreTxn},
};

/// Everything a merge would do, computed but not yet written.
#[derive(Debug)]
pub struct MergePlan {
  pub changes:     ChangeSet,
  pub report:      MergeReport,
  /// Label for the transaction commit.
  pub description: String,
}

/// Merge `secondary_id` into `primary_id`.
///
/// On success the survivor holds the union of both records, every family
/// that referenced the absorbed person references the survivor, and the
/// absorbed person is gone. On error the store is unchanged.
pub fn merge<S: RecordStore>(
  store: &mut S,
  primary_id: PersonId,
  secondary_id: PersonId,
) -> Result<MergeReport> {
  if primary_id == secondary_id {
    return Err(MergeError::SamePerson(primary_id));
  }

  let mut txn = store.transaction_begin().map_err(MergeError::read)?;
  let plan = plan_merge(&txn, primary_id, secondary_id)?;

  plan.changes.apply(&mut txn)?;
  txn.commit(&plan.description).map_err(MergeError::write)?;

  info!(
    survivor = %primary_id,
    removed = %secondary_id,
    merged_families = plan.report.merged_families.len(),
    rewritten_families = plan.report.rewritten_families.len(),
    orphaned_families = plan.report.orphaned_families.len(),
    "merge committed",
  );
  Ok(plan.report)
}

/// Run every check and compute the merge without writing anything. The
/// transaction is rolled back when it drops.
pub fn check_merge<S: RecordStore>(
  store: &mut S,
  primary_id: PersonId,
  secondary_id: PersonId,
) -> Result<MergeReport> {
  if primary_id == secondary_id {
    return Err(MergeError::SamePerson(primary_id));
  }
  let txn = store.transaction_begin().map_err(MergeError::read)?;
  Ok(plan_merge(&txn, primary_id, secondary_id)?.report)
}

/// Compute the merge of `secondary_id` into `primary_id` against `txn`.
pub fn plan_merge<T: StoreTxn>(
  txn: &T,
  primary_id: PersonId,
  secondary_id: PersonId,
) -> Result<MergePlan> {
  let mut stage = Staging::new(txn);
  let primary = stage.person(primary_id)?.clone();
  let secondary = stage.person(secondary_id)?.clone();

  precheck(&primary, &secondary)?;
  check_unrelated_by_descent(txn, primary_id, secondary_id)?;

  debug!(
    survivor = %primary.display_id,
    removed = %secondary.display_id,
    spouse_families = secondary.spouse_families.len(),
    parent_families = secondary.parent_families.len(),
    "planning merge",
  );

  stage.put_person(merge_person_fields(&primary, &secondary));
  stage.remove_person(secondary_id);

  let mut report = MergeReport::new(primary_id, secondary_id);
  reconcile(&mut stage, primary_id, &secondary, &mut report)?;

  let changes = stage.into_changes()?;
  report.record_changes(&changes);

  Ok(MergePlan {
    changes,
    report,
    description: format!(
      "Merge Person {} <- {}",
      primary.display_id, secondary.display_id
    ),
  })
}
