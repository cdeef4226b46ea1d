//! Collection merge policies.
//!
//! Pure functions that combine two collections of the same kind into one. The
//! first argument always belongs to the surviving record and keeps its order;
//! items from the second are appended unless the kind's duplicate rule says
//! they are already present.
//!
//! | Kind | Rule |
//! |------|------|
//! | alternate names | union, structural equality |
//! | event references | union, by event id |
//! | citations | union, by source id |
//! | child references | union, by child id |
//! | attributes, addresses, URLs, media | concatenation |
//! | notes | blank-line join when both present and different |
//! | privacy | logical OR |

use crate::{
  family::{ChildRef, ChildRelation, FamilyRelation},
  id::{EventId, PersonId, SourceId},
  person::Name,
  value::{Citation, EventRef},
};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Items whose duplicates are detected by a single identifier.
pub trait Keyed {
  type Key: PartialEq;

  fn key(&self) -> Self::Key;
}

impl Keyed for EventRef {
  type Key = EventId;

  fn key(&self) -> EventId { self.event }
}

impl Keyed for Citation {
  type Key = SourceId;

  fn key(&self) -> SourceId { self.source }
}

impl Keyed for ChildRef {
  type Key = PersonId;

  fn key(&self) -> PersonId { self.child }
}

// ─── Generic combinators ─────────────────────────────────────────────────────

/// `first` unchanged, then every item of `second` for which `same` finds no
/// match among the items collected so far.
pub fn union_by<T, F>(first: &[T], second: &[T], same: F) -> Vec<T>
where
  T: Clone,
  F: Fn(&T, &T) -> bool,
{
  let mut out = first.to_vec();
  for item in second {
    if !out.iter().any(|kept| same(kept, item)) {
      out.push(item.clone());
    }
  }
  out
}

/// [`union_by`] comparing [`Keyed::key`].
pub fn union_by_key<T>(first: &[T], second: &[T]) -> Vec<T>
where
  T: Keyed + Clone,
{
  union_by(first, second, |a, b| a.key() == b.key())
}

pub fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
  let mut out = Vec::with_capacity(first.len() + second.len());
  out.extend_from_slice(first);
  out.extend_from_slice(second);
  out
}

// ─── Per-kind policies ───────────────────────────────────────────────────────

/// Alternate names of the merged person.
///
/// The survivor's alternates come first, then the absorbed person's primary
/// name, then the absorbed person's alternates. Names structurally identical
/// to the survivor's primary name or to one already collected are skipped.
pub fn merge_names(
  primary_name: &Name,
  primary_alternates: &[Name],
  secondary_name: &Name,
  secondary_alternates: &[Name],
) -> Vec<Name> {
  let mut incoming = Vec::with_capacity(secondary_alternates.len() + 1);
  incoming.push(secondary_name.clone());
  incoming.extend_from_slice(secondary_alternates);
  incoming.retain(|n| n != primary_name);
  union_by(primary_alternates, &incoming, |a, b| a == b)
}

pub fn merge_event_refs(first: &[EventRef], second: &[EventRef]) -> Vec<EventRef> {
  union_by_key(first, second)
}

pub fn merge_citations(first: &[Citation], second: &[Citation]) -> Vec<Citation> {
  union_by_key(first, second)
}

/// Resolve a birth or death reference.
///
/// Returns the reference to keep in the vital slot, plus the secondary's
/// reference when it points at a different event and must be kept among the
/// ordinary events instead.
pub fn merge_vital(
  primary: Option<&EventRef>,
  secondary: Option<&EventRef>,
) -> (Option<EventRef>, Option<EventRef>) {
  match (primary, secondary) {
    (Some(p), Some(s)) if p.event != s.event => (Some(p.clone()), Some(s.clone())),
    (Some(p), _) => (Some(p.clone()), None),
    (None, s) => (s.cloned(), None),
  }
}

pub fn merge_notes(first: &str, second: &str) -> String {
  match (first.is_empty(), second.is_empty()) {
    (false, false) if first != second => format!("{first}\n\n{second}"),
    (true, false) => second.to_owned(),
    _ => first.to_owned(),
  }
}

/// Fold a dropped reference to the same child into the kept one: unknown
/// relation tags are filled in and privacy is OR-ed.
pub fn merge_child_ref(kept: &mut ChildRef, dropped: &ChildRef) {
  if kept.father_relation == ChildRelation::Unknown {
    kept.father_relation = dropped.father_relation.clone();
  }
  if kept.mother_relation == ChildRelation::Unknown {
    kept.mother_relation = dropped.mother_relation.clone();
  }
  kept.private |= dropped.private;
}

pub fn merge_relationship(
  target: FamilyRelation,
  source: FamilyRelation,
) -> FamilyRelation {
  match target {
    FamilyRelation::Unknown => source,
    known => known,
  }
}
