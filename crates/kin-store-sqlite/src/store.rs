//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use kin_core::{
  MergeReport,
  family::Family,
  id::{FamilyId, PersonId},
  person::Person,
  store::{RecordStore, StoreTxn},
};

use crate::{
  Result,
  encode::{
    FamilyRow, PersonRow, RawJournalEntry, decode_person, decode_uuid, encode_dt,
    encode_family_id, encode_person_id, encode_uuid,
  },
  schema::SCHEMA,
};

/// One committed merge, as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
  pub entry_id:    Uuid,
  pub description: String,
  pub recorded_at: DateTime<Utc>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kin record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// Insert or replace a person outside of any merge.
  pub async fn put_person(&self, person: &Person) -> Result<()> {
    let row = PersonRow::encode(person)?;
    self
      .conn
      .call(move |conn| Ok(upsert_person(conn, &row)?))
      .await?;
    Ok(())
  }

  /// Insert or replace a family outside of any merge.
  pub async fn put_family(&self, family: &Family) -> Result<()> {
    let row = FamilyRow::encode(family)?;
    self
      .conn
      .call(move |conn| Ok(upsert_family(conn, &row)?))
      .await?;
    Ok(())
  }

  pub async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let id_str = encode_person_id(id);
    let body = self
      .conn
      .call(move |conn| Ok(select_person(conn, &id_str)?))
      .await?;
    body.as_deref().map(decode_person).transpose()
  }

  pub async fn get_family(&self, id: FamilyId) -> Result<Option<Family>> {
    let id_str = encode_family_id(id);
    let row = self
      .conn
      .call(move |conn| Ok(select_family(conn, &id_str)?))
      .await?;
    row.map(FamilyRow::into_family).transpose()
  }

  pub async fn list_persons(&self) -> Result<Vec<Person>> {
    let bodies: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT body_json FROM persons ORDER BY person_id")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|b| decode_person(b)).collect()
  }

  pub async fn list_families(&self) -> Result<Vec<Family>> {
    let rows: Vec<FamilyRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT family_id, father_id, mother_id, body_json
           FROM families ORDER BY family_id",
        )?;
        let rows = stmt
          .query_map([], family_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(FamilyRow::into_family).collect()
  }

  // ── Merging ───────────────────────────────────────────────────────────────

  /// Merge `secondary` into `primary` in one SQLite transaction and record
  /// the merge in the journal. Nothing is written if the merge fails.
  pub async fn merge_persons(
    &self,
    primary: PersonId,
    secondary: PersonId,
  ) -> Result<MergeReport> {
    let outcome = self
      .conn
      .call(move |conn| Ok(kin_core::merge(&mut Session(conn), primary, secondary)))
      .await?;
    Ok(outcome?)
  }

  /// Run every merge check and report what a merge would do, writing
  /// nothing.
  pub async fn check_merge(
    &self,
    primary: PersonId,
    secondary: PersonId,
  ) -> Result<MergeReport> {
    let outcome = self
      .conn
      .call(move |conn| {
        Ok(kin_core::check_merge(&mut Session(conn), primary, secondary))
      })
      .await?;
    Ok(outcome?)
  }

  /// Every committed merge, oldest first.
  pub async fn journal(&self) -> Result<Vec<JournalEntry>> {
    let raws: Vec<RawJournalEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, description, recorded_at
           FROM merge_journal ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawJournalEntry {
              entry_id:    row.get(0)?,
              description: row.get(1)?,
              recorded_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJournalEntry::into_entry).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

/// The connection as seen from inside [`tokio_rusqlite::Connection::call`],
/// where the synchronous merge engine runs.
struct Session<'c>(&'c mut Connection);

impl RecordStore for Session<'_> {
  type Error = crate::Error;
  type Txn<'a>
    = SqliteTxn<'a>
  where
    Self: 'a;

  fn transaction_begin(&mut self) -> Result<SqliteTxn<'_>> {
    let tx = self.0.transaction_with_behavior(TransactionBehavior::Immediate)?;
    Ok(SqliteTxn { tx })
  }
}

/// A merge transaction. Dropping it rolls back.
pub struct SqliteTxn<'c> {
  tx: rusqlite::Transaction<'c>,
}

impl StoreTxn for SqliteTxn<'_> {
  type Error = crate::Error;

  fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    select_person(&self.tx, &encode_person_id(id))?
      .as_deref()
      .map(decode_person)
      .transpose()
  }

  fn get_family(&self, id: FamilyId) -> Result<Option<Family>> {
    select_family(&self.tx, &encode_family_id(id))?
      .map(FamilyRow::into_family)
      .transpose()
  }

  fn find_families_by_parents(
    &self,
    father: Option<PersonId>,
    mother: Option<PersonId>,
  ) -> Result<Vec<FamilyId>> {
    let father = father.map(encode_person_id);
    let mother = mother.map(encode_person_id);
    select_families_by_parents(&self.tx, father.as_deref(), mother.as_deref())?
      .iter()
      .map(|id| Ok(FamilyId::from(decode_uuid(id)?)))
      .collect()
  }

  fn commit_person(&mut self, person: &Person) -> Result<()> {
    upsert_person(&self.tx, &PersonRow::encode(person)?)?;
    Ok(())
  }

  fn remove_person(&mut self, id: PersonId) -> Result<()> {
    self.tx.execute(
      "DELETE FROM persons WHERE person_id = ?1",
      rusqlite::params![encode_person_id(id)],
    )?;
    Ok(())
  }

  fn commit_family(&mut self, family: &Family) -> Result<()> {
    upsert_family(&self.tx, &FamilyRow::encode(family)?)?;
    Ok(())
  }

  fn remove_family(&mut self, id: FamilyId) -> Result<()> {
    self.tx.execute(
      "DELETE FROM families WHERE family_id = ?1",
      rusqlite::params![encode_family_id(id)],
    )?;
    Ok(())
  }

  fn commit(self, description: &str) -> Result<()> {
    let entry_id = encode_uuid(Uuid::new_v4());
    self.tx.execute(
      "INSERT INTO merge_journal (entry_id, description, recorded_at)
       VALUES (?1, ?2, ?3)",
      rusqlite::params![entry_id, description, encode_dt(Utc::now())],
    )?;
    self.tx.commit()?;
    debug!(entry = %entry_id, description, "journalled merge");
    Ok(())
  }
}

// ─── Row access ──────────────────────────────────────────────────────────────

fn upsert_person(conn: &Connection, row: &PersonRow) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO persons (person_id, body_json) VALUES (?1, ?2)
     ON CONFLICT (person_id) DO UPDATE SET body_json = excluded.body_json",
    rusqlite::params![row.person_id, row.body_json],
  )?;
  Ok(())
}

fn upsert_family(conn: &Connection, row: &FamilyRow) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO families (family_id, father_id, mother_id, body_json)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (family_id) DO UPDATE SET
       father_id = excluded.father_id,
       mother_id = excluded.mother_id,
       body_json = excluded.body_json",
    rusqlite::params![row.family_id, row.father_id, row.mother_id, row.body_json],
  )?;
  Ok(())
}

fn select_person(conn: &Connection, id: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT body_json FROM persons WHERE person_id = ?1",
      rusqlite::params![id],
      |row| row.get(0),
    )
    .optional()
}

fn select_family(conn: &Connection, id: &str) -> rusqlite::Result<Option<FamilyRow>> {
  conn
    .query_row(
      "SELECT family_id, father_id, mother_id, body_json
       FROM families WHERE family_id = ?1",
      rusqlite::params![id],
      family_row,
    )
    .optional()
}

/// `IS` rather than `=` so that an empty slot matches only `NULL`.
fn select_families_by_parents(
  conn: &Connection,
  father: Option<&str>,
  mother: Option<&str>,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT family_id FROM families
     WHERE father_id IS ?1 AND mother_id IS ?2
     ORDER BY family_id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![father, mother], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

fn family_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FamilyRow> {
  Ok(FamilyRow {
    family_id: row.get(0)?,
    father_id: row.get(1)?,
    mother_id: row.get(2)?,
    body_json: row.get(3)?,
  })
}
