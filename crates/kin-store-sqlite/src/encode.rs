//! Encoding and decoding helpers between domain records and the plain-text
//! representations stored in SQLite columns.
//!
//! Record bodies are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings and timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use kin_core::{
  family::Family,
  id::{FamilyId, PersonId},
  person::Person,
};
use uuid::Uuid;

use crate::{Error, Result, store::JournalEntry};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_person_id(id: PersonId) -> String { encode_uuid(id.as_uuid()) }

pub fn encode_family_id(id: FamilyId) -> String { encode_uuid(id.as_uuid()) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values for a `persons` row.
pub struct PersonRow {
  pub person_id: String,
  pub body_json: String,
}

impl PersonRow {
  pub fn encode(person: &Person) -> Result<Self> {
    Ok(Self {
      person_id: encode_person_id(person.id),
      body_json: serde_json::to_string(person)?,
    })
  }
}

pub fn decode_person(body_json: &str) -> Result<Person> {
  Ok(serde_json::from_str(body_json)?)
}

/// Column values for a `families` row. The parent columns duplicate the
/// body so that lookups by parent pair can use the index.
pub struct FamilyRow {
  pub family_id: String,
  pub father_id: Option<String>,
  pub mother_id: Option<String>,
  pub body_json: String,
}

impl FamilyRow {
  pub fn encode(family: &Family) -> Result<Self> {
    Ok(Self {
      family_id: encode_family_id(family.id),
      father_id: family.father.map(encode_person_id),
      mother_id: family.mother.map(encode_person_id),
      body_json: serde_json::to_string(family)?,
    })
  }

  pub fn into_family(self) -> Result<Family> {
    let family: Family = serde_json::from_str(&self.body_json)?;
    let father = self.father_id.as_deref().map(decode_uuid).transpose()?;
    let mother = self.mother_id.as_deref().map(decode_uuid).transpose()?;
    if father != family.father.map(|p| p.as_uuid())
      || mother != family.mother.map(|p| p.as_uuid())
    {
      return Err(Error::CorruptFamily(family.id.as_uuid()));
    }
    Ok(family)
  }
}

/// Raw strings read directly from a `merge_journal` row.
pub struct RawJournalEntry {
  pub entry_id:    String,
  pub description: String,
  pub recorded_at: String,
}

impl RawJournalEntry {
  pub fn into_entry(self) -> Result<JournalEntry> {
    Ok(JournalEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      description: self.description,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
