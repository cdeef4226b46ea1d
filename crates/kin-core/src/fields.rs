//! Field-level merge of two person records.

use tracing::warn;

use crate::{
  person::Person,
  policy::{
    concat, merge_citations, merge_event_refs, merge_names, merge_notes,
    merge_vital,
  },
  value::{Attribute, AttributeKind},
};

/// Combine the fields of `secondary` into a copy of `primary`.
///
/// Family back-reference sets are copied from `primary` untouched; family
/// reconciliation owns them.
pub fn merge_person_fields(primary: &Person, secondary: &Person) -> Person {
  if primary.gender != secondary.gender {
    // Kept as-is: the survivor's gender wins even when the two disagree.
    warn!(
      primary = %primary.id,
      secondary = %secondary.id,
      kept = %primary.gender,
      dropped = %secondary.gender,
      "merging persons of different gender",
    );
  }

  let (birth, extra_birth) =
    merge_vital(primary.birth.as_ref(), secondary.birth.as_ref());
  let (death, extra_death) =
    merge_vital(primary.death.as_ref(), secondary.death.as_ref());

  let mut events = merge_event_refs(&primary.events, &secondary.events);
  let displaced: Vec<_> = extra_birth.into_iter().chain(extra_death).collect();
  events = merge_event_refs(&events, &displaced);
  // A vital event is never listed twice.
  events.retain(|r| {
    birth.as_ref().is_none_or(|b| b.event != r.event)
      && death.as_ref().is_none_or(|d| d.event != r.event)
  });

  let mut attributes = concat(&primary.attributes, &secondary.attributes);
  attributes.push(Attribute {
    kind:  AttributeKind::MergedId,
    value: secondary.display_id.clone(),
  });

  Person {
    id: primary.id,
    display_id: primary.display_id.clone(),
    gender: primary.gender,
    primary_name: primary.primary_name.clone(),
    alternate_names: merge_names(
      &primary.primary_name,
      &primary.alternate_names,
      &secondary.primary_name,
      &secondary.alternate_names,
    ),
    nickname: primary.nickname.clone().or_else(|| secondary.nickname.clone()),
    birth,
    death,
    events,
    attributes,
    addresses: concat(&primary.addresses, &secondary.addresses),
    urls: concat(&primary.urls, &secondary.urls),
    media: concat(&primary.media, &secondary.media),
    citations: merge_citations(&primary.citations, &secondary.citations),
    note: merge_notes(&primary.note, &secondary.note),
    private: primary.private || secondary.private,
    spouse_families: primary.spouse_families.clone(),
    parent_families: primary.parent_families.clone(),
    main_parent_family: primary.main_parent_family,
  }
}
