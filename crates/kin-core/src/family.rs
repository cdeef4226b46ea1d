//! The Family record: up to two parents and their children.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  id::{FamilyId, PersonId},
  value::{Attribute, Citation, EventRef, MediaRef},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FamilyRelation {
  Married,
  Unmarried,
  CivilUnion,
  #[default]
  Unknown,
}

/// How a child is related to one of the parents of a family.
#[derive(
  Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChildRelation {
  #[default]
  Birth,
  Adopted,
  Stepchild,
  Sponsored,
  Foster,
  Unknown,
  #[strum(default)]
  Custom(String),
}

impl fmt::Display for ChildRelation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Birth => f.write_str("birth"),
      Self::Adopted => f.write_str("adopted"),
      Self::Stepchild => f.write_str("stepchild"),
      Self::Sponsored => f.write_str("sponsored"),
      Self::Foster => f.write_str("foster"),
      Self::Unknown => f.write_str("unknown"),
      Self::Custom(s) => f.write_str(s),
    }
  }
}

/// One entry in a family's child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
  pub child:           PersonId,
  pub father_relation: ChildRelation,
  pub mother_relation: ChildRelation,
  pub private:         bool,
}

impl ChildRef {
  /// A birth child of both parents.
  pub fn birth(child: PersonId) -> Self {
    Self {
      child,
      father_relation: ChildRelation::Birth,
      mother_relation: ChildRelation::Birth,
      private: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
  pub id:           FamilyId,
  /// User-facing id, e.g. `F0007`.
  pub display_id:   String,
  pub father:       Option<PersonId>,
  pub mother:       Option<PersonId>,
  pub children:     Vec<ChildRef>,
  pub relationship: FamilyRelation,
  pub events:       Vec<EventRef>,
  pub attributes:   Vec<Attribute>,
  pub media:        Vec<MediaRef>,
  pub citations:    Vec<Citation>,
  pub note:         String,
  pub private:      bool,
}

impl Family {
  pub fn new(
    display_id: impl Into<String>,
    father: Option<PersonId>,
    mother: Option<PersonId>,
  ) -> Self {
    Self {
      id: FamilyId::new(),
      display_id: display_id.into(),
      father,
      mother,
      children: Vec::new(),
      relationship: FamilyRelation::Unknown,
      events: Vec::new(),
      attributes: Vec::new(),
      media: Vec::new(),
      citations: Vec::new(),
      note: String::new(),
      private: false,
    }
  }

  /// The father and mother slots, in that order.
  pub fn parents(&self) -> (Option<PersonId>, Option<PersonId>) {
    (self.father, self.mother)
  }

  pub fn has_parent(&self, person: PersonId) -> bool {
    self.father == Some(person) || self.mother == Some(person)
  }

  pub fn has_child(&self, person: PersonId) -> bool {
    self.children.iter().any(|c| c.child == person)
  }

  /// The slot-for-slot pair this family would have with `from` replaced by
  /// `to`.
  pub fn parents_with(
    &self,
    from: PersonId,
    to: PersonId,
  ) -> (Option<PersonId>, Option<PersonId>) {
    let swap = |slot: Option<PersonId>| {
      if slot == Some(from) { Some(to) } else { slot }
    };
    (swap(self.father), swap(self.mother))
  }

  /// Rewrite whichever parent slot holds `from` to hold `to`.
  pub fn replace_parent(&mut self, from: PersonId, to: PersonId) -> bool {
    let (father, mother) = self.parents_with(from, to);
    let changed = (father, mother) != (self.father, self.mother);
    self.father = father;
    self.mother = mother;
    changed
  }

  /// No parents and no children: nothing left worth persisting.
  pub fn is_orphan(&self) -> bool {
    self.father.is_none() && self.mother.is_none() && self.children.is_empty()
  }
}
