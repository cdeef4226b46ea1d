//! Family reconciliation.
//!
//! Once the absorbed person's fields are folded into the survivor, every
//! family that referenced the absorbed person must be made to reference the
//! survivor instead, without creating two families for the same couple and
//! without breaking any back-reference. Two passes run in a fixed order:
//!
//! 1. **Parent families** (the absorbed person as a child): child references
//!    are retargeted to the survivor, or dropped where the survivor is already
//!    a child of that family.
//! 2. **Spouse families** (the absorbed person as a parent): each family is
//!    either rewritten in place, or dissolved into an existing family with the
//!    same father/mother pair.
//!
//! Finally every family the merge touched is checked for orphanhood.

use tracing::{debug, warn};

use crate::{
  MergeError, Result,
  family::{ChildRef, Family},
  id::{FamilyId, PersonId},
  person::Person,
  policy::{
    concat, merge_child_ref, merge_citations, merge_event_refs, merge_notes,
    merge_relationship,
  },
  report::{FamilyMerge, MergeReport, TargetLink},
  staging::Staging,
  store::StoreTxn,
};

/// Run both passes and the orphan sweep.
///
/// Expects the survivor to be staged already (with merged fields) and the
/// absorbed person to be staged for removal; `secondary` is the absorbed
/// person as it was before the merge.
pub fn reconcile<T: StoreTxn>(
  stage: &mut Staging<'_, T>,
  primary: PersonId,
  secondary: &Person,
  report: &mut MergeReport,
) -> Result<()> {
  reconcile_parent_families(stage, primary, secondary)?;
  reconcile_spouse_families(stage, primary, secondary, report)?;
  remove_orphans(stage, report)
}

// ─── Parent families ─────────────────────────────────────────────────────────

fn reconcile_parent_families<T: StoreTxn>(
  stage: &mut Staging<'_, T>,
  primary: PersonId,
  secondary: &Person,
) -> Result<()> {
  let mut survivor = stage.person(primary)?.clone();

  for &family_id in &secondary.parent_families {
    let mut family = stage.family(family_id)?.clone();
    let relinked = relink_child(&mut family, secondary.id, primary);

    if family.has_child(primary) {
      survivor.parent_families.insert(family_id);
    } else {
      warn!(
        family = %family_id,
        person = %secondary.id,
        "parent family does not list its child; dropping stale link",
      );
    }

    if relinked {
      debug!(family = %family_id, "retargeted child reference");
      stage.put_family(family);
    } else {
      stage.touch_family(family_id);
    }
  }

  if survivor.main_parent_family.is_none() {
    survivor.main_parent_family = secondary
      .main_parent_family
      .filter(|f| survivor.parent_families.contains(f));
  }
  stage.put_person(survivor);
  Ok(())
}

/// Point every child reference to `from` at `to`. Where `to` is already a
/// child of the family, the reference to `from` is folded into it instead.
fn relink_child(family: &mut Family, from: PersonId, to: PersonId) -> bool {
  let mut changed = false;
  while let Some(pos) = family.children.iter().position(|c| c.child == from) {
    let dropped = family.children.remove(pos);
    match family.children.iter_mut().find(|c| c.child == to) {
      Some(kept) => merge_child_ref(kept, &dropped),
      None => family.children.insert(pos, ChildRef { child: to, ..dropped }),
    }
    changed = true;
  }
  changed
}

// ─── Spouse families ─────────────────────────────────────────────────────────

fn reconcile_spouse_families<T: StoreTxn>(
  stage: &mut Staging<'_, T>,
  primary: PersonId,
  secondary: &Person,
  report: &mut MergeReport,
) -> Result<()> {
  for &source_id in &secondary.spouse_families {
    if stage.person(primary)?.spouse_families.contains(&source_id) {
      continue;
    }

    let source = stage.family(source_id)?.clone();
    if !source.has_parent(secondary.id) {
      warn!(
        family = %source_id,
        person = %secondary.id,
        "spouse family does not name its parent; dropping stale link",
      );
      stage.touch_family(source_id);
      continue;
    }

    let (father, mother) = source.parents_with(secondary.id, primary);
    if father.is_some() && father == mother {
      return Err(MergeError::InvariantViolation(format!(
        "family {source_id} would name {primary} as both father and mother"
      )));
    }

    match stage.find_family_by_parents(father, mother, source_id)? {
      None => {
        let mut family = source;
        family.replace_parent(secondary.id, primary);
        stage.put_family(family);

        let mut survivor = stage.person(primary)?.clone();
        survivor.spouse_families.insert(source_id);
        stage.put_person(survivor);

        debug!(family = %source_id, "rewrote parent slot in place");
        report.rewritten_families.insert(source_id);
      }
      Some(target_id) => {
        let link = if stage.person(primary)?.spouse_families.contains(&target_id) {
          TargetLink::Existing
        } else {
          TargetLink::Added
        };

        merge_family_pair(stage, target_id, &source, secondary.id, primary)?;

        if link == TargetLink::Added {
          let mut target = stage.family(target_id)?.clone();
          if target.replace_parent(secondary.id, primary) {
            stage.put_family(target);
          }
          let mut survivor = stage.person(primary)?.clone();
          survivor.spouse_families.insert(target_id);
          stage.put_person(survivor);
        }

        debug!(
          source = %source_id,
          target = %target_id,
          ?link,
          "merged duplicate family",
        );
        report.merged_families.push(FamilyMerge {
          source: source_id,
          target: target_id,
          link,
        });
      }
    }
  }
  Ok(())
}

/// Dissolve `source` into the family `target_id` and remove `source`.
fn merge_family_pair<T: StoreTxn>(
  stage: &mut Staging<'_, T>,
  target_id: FamilyId,
  source: &Family,
  secondary: PersonId,
  primary: PersonId,
) -> Result<()> {
  let mut target = stage.family(target_id)?.clone();

  for child_ref in &source.children {
    match target.children.iter_mut().find(|c| c.child == child_ref.child) {
      Some(kept) => merge_child_ref(kept, child_ref),
      None => target.children.push(child_ref.clone()),
    }
    let mut child = stage.person(child_ref.child)?.clone();
    if child.repoint_parent_family(source.id, target_id) {
      stage.put_person(child);
    }
  }

  target.events = merge_event_refs(&target.events, &source.events);
  target.attributes = concat(&target.attributes, &source.attributes);
  target.media = concat(&target.media, &source.media);
  target.citations = merge_citations(&target.citations, &source.citations);
  target.note = merge_notes(&target.note, &source.note);
  target.private |= source.private;
  target.relationship = merge_relationship(target.relationship, source.relationship);

  for parent in [source.father, source.mother].into_iter().flatten() {
    if parent == secondary || parent == primary {
      continue;
    }
    let Some(person) = stage.find_person(parent)? else {
      continue;
    };
    let mut person = person.clone();
    person.spouse_families.remove(&source.id);
    if target.has_parent(parent) {
      person.spouse_families.insert(target_id);
    }
    stage.put_person(person);
  }

  stage.put_family(target);
  stage.remove_family(source.id);
  Ok(())
}

// ─── Orphans ─────────────────────────────────────────────────────────────────

fn remove_orphans<T: StoreTxn>(
  stage: &mut Staging<'_, T>,
  report: &mut MergeReport,
) -> Result<()> {
  for family_id in stage.touched_families() {
    if !stage.family(family_id)?.is_orphan() {
      continue;
    }
    debug!(family = %family_id, "removing orphan family");
    stage.forget_family_everywhere(family_id);
    stage.remove_family(family_id);
    report.orphaned_families.insert(family_id);
  }
  Ok(())
}
