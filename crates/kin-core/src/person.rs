//! The Person record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  id::{FamilyId, PersonId},
  value::{Address, Attribute, Citation, EventRef, MediaRef, Url},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  #[default]
  Unknown,
}

/// A structured personal name. Two names are the same name when every token
/// matches; the derived equality is exactly that comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
  pub given:   String,
  pub surname: String,
  pub suffix:  String,
  pub title:   String,
  pub prefix:  String,
}

impl Name {
  pub fn new(given: impl Into<String>, surname: impl Into<String>) -> Self {
    Self { given: given.into(), surname: surname.into(), ..Self::default() }
  }

  /// `"Title Given Prefix Surname Suffix"`, skipping empty tokens.
  pub fn display(&self) -> String {
    [&self.title, &self.given, &self.prefix, &self.surname, &self.suffix]
      .into_iter()
      .filter(|t| !t.is_empty())
      .map(String::as_str)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// One individual.
///
/// `spouse_families` and `parent_families` are back-references: every family
/// listed must name this person as a parent (respectively as a child), and
/// vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:                 PersonId,
  /// User-facing id, e.g. `I0042`.
  pub display_id:         String,
  pub gender:             Gender,
  pub primary_name:       Name,
  pub alternate_names:    Vec<Name>,
  pub nickname:           Option<String>,
  pub birth:              Option<EventRef>,
  pub death:              Option<EventRef>,
  pub events:             Vec<EventRef>,
  pub attributes:         Vec<Attribute>,
  pub addresses:          Vec<Address>,
  pub urls:               Vec<Url>,
  pub media:              Vec<MediaRef>,
  pub citations:          Vec<Citation>,
  pub note:               String,
  pub private:            bool,
  /// Families in which this person is the father or mother.
  pub spouse_families:    BTreeSet<FamilyId>,
  /// Families in which this person is a child.
  pub parent_families:    BTreeSet<FamilyId>,
  /// The preferred entry of `parent_families`, if any.
  pub main_parent_family: Option<FamilyId>,
}

impl Person {
  /// A person with a fresh identifier and nothing but a name.
  pub fn new(display_id: impl Into<String>, name: Name) -> Self {
    Self {
      id:                 PersonId::new(),
      display_id:         display_id.into(),
      gender:             Gender::Unknown,
      primary_name:       name,
      alternate_names:    Vec::new(),
      nickname:           None,
      birth:              None,
      death:              None,
      events:             Vec::new(),
      attributes:         Vec::new(),
      addresses:          Vec::new(),
      urls:               Vec::new(),
      media:              Vec::new(),
      citations:          Vec::new(),
      note:               String::new(),
      private:            false,
      spouse_families:    BTreeSet::new(),
      parent_families:    BTreeSet::new(),
      main_parent_family: None,
    }
  }

  pub fn with_gender(mut self, gender: Gender) -> Self {
    self.gender = gender;
    self
  }

  /// Drop `family` from both back-reference sets and from the main pointer.
  pub fn forget_family(&mut self, family: FamilyId) -> bool {
    let spouse = self.spouse_families.remove(&family);
    let parent = self.forget_parent_family(family);
    spouse || parent
  }

  /// Drop `family` from the parent-family set, clearing the main pointer if it
  /// named that family.
  pub fn forget_parent_family(&mut self, family: FamilyId) -> bool {
    if self.main_parent_family == Some(family) {
      self.main_parent_family = None;
    }
    self.parent_families.remove(&family)
  }

  /// Swap every parent-family reference to `from` for one to `to`.
  pub fn repoint_parent_family(&mut self, from: FamilyId, to: FamilyId) -> bool {
    if !self.parent_families.remove(&from) {
      return false;
    }
    self.parent_families.insert(to);
    if self.main_parent_family == Some(from) {
      self.main_parent_family = Some(to);
    }
    true
  }
}
