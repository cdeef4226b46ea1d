//! Value types shared by persons and families.
//!
//! These are plain data. The rules for combining two collections of them live
//! in [`crate::policy`].

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::id::{EventId, MediaId, SourceId};

// ─── Events ──────────────────────────────────────────────────────────────────

/// The part a record played in an event.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventRole {
  #[default]
  Primary,
  Family,
  Witness,
  Clergy,
  Informant,
  Unknown,
}

/// A reference to an immutable event record. Merges move and copy references;
/// the events themselves are never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
  pub event: EventId,
  pub role:  EventRole,
}

impl EventRef {
  pub fn primary(event: EventId) -> Self {
    Self { event, role: EventRole::Primary }
  }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// What an [`Attribute`] describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributeKind {
  Description,
  Occupation,
  Nationality,
  /// The display id of a record absorbed by a merge.
  MergedId,
  #[strum(default)]
  Custom(String),
}

impl fmt::Display for AttributeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Description => f.write_str("description"),
      Self::Occupation => f.write_str("occupation"),
      Self::Nationality => f.write_str("nationality"),
      Self::MergedId => f.write_str("merged_id"),
      Self::Custom(s) => f.write_str(s),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub kind:  AttributeKind,
  pub value: String,
}

// ─── Addresses and URLs ──────────────────────────────────────────────────────

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub street:      Option<String>,
  /// City or locality.
  pub locality:    Option<String>,
  /// State, province, or region.
  pub region:      Option<String>,
  pub postal_code: Option<String>,
  pub country:     Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
  pub url:         String,
  pub description: Option<String>,
}

// ─── Media ───────────────────────────────────────────────────────────────────

/// A reference to a media object, optionally cropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
  pub media:  MediaId,
  /// Crop rectangle as percentages `(x1, y1, x2, y2)`.
  pub region: Option<(u8, u8, u8, u8)>,
}

// ─── Citations ───────────────────────────────────────────────────────────────

/// How much weight a citation carries.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
  #[default]
  Certain,
  Probable,
  Rumored,
}

/// A citation of a source record. Two citations of the same source are
/// duplicates regardless of page or confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
  pub source:     SourceId,
  pub page:       Option<String>,
  pub confidence: Confidence,
}

impl Citation {
  pub fn new(source: SourceId) -> Self {
    Self { source, page: None, confidence: Confidence::default() }
  }
}
