//! `kin`: merge duplicate persons in a Kin record store.
//!
//! # Usage
//!
//! ```
//! kin check <PRIMARY> <SECONDARY>
//! kin merge <PRIMARY> <SECONDARY>
//! kin --store ~/trees/family.db show <PERSON>
//! kin journal
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kin_core::{family::Family, id::PersonId, person::Person};
use kin_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "kin", author, version, about = "Merge duplicate persons in a Kin record store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "kin.toml")]
  config: PathBuf,

  /// SQLite store to open; overrides the config file and `KIN_STORE_PATH`.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Merge SECONDARY into PRIMARY and delete SECONDARY.
  Merge { primary: Uuid, secondary: Uuid },
  /// Report what a merge would do without writing anything.
  Check { primary: Uuid, secondary: Uuid },
  /// Print a person together with the families they belong to.
  Show { person: Uuid },
  /// List committed merges, oldest first.
  Journal,
}

/// A person and the families they belong to, for `kin show`.
#[derive(Serialize)]
struct PersonView {
  person:          Person,
  spouse_families: Vec<Family>,
  parent_families: Vec<Family>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = settings::load(&cli.config, cli.store)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Merge { primary, secondary } => {
      let (primary, secondary) = (PersonId::from(primary), PersonId::from(secondary));
      let report = store
        .merge_persons(primary, secondary)
        .await
        .inspect_err(|e| {
          if e.is_precondition() {
            warn!(%primary, %secondary, "merge refused: {e}");
          }
        })
        .context("merge failed")?;
      info!(survivor = %report.survivor, "merged");
      print_json(&report)?;
    }
    Command::Check { primary, secondary } => {
      let report = store
        .check_merge(primary.into(), secondary.into())
        .await
        .context("merge check failed")?;
      print_json(&report)?;
    }
    Command::Show { person } => {
      let view = show(&store, person.into()).await?;
      print_json(&view)?;
    }
    Command::Journal => {
      let entries = store.journal().await.context("failed to read journal")?;
      print_json(&entries)?;
    }
  }

  Ok(())
}

async fn show(store: &SqliteStore, id: PersonId) -> anyhow::Result<PersonView> {
  let person = store
    .get_person(id)
    .await?
    .with_context(|| format!("no person with id {id}"))?;

  let mut spouse_families = Vec::with_capacity(person.spouse_families.len());
  for family_id in &person.spouse_families {
    match store.get_family(*family_id).await? {
      Some(f) => spouse_families.push(f),
      None => warn!(family = %family_id, "spouse family is missing"),
    }
  }

  let mut parent_families = Vec::with_capacity(person.parent_families.len());
  for family_id in &person.parent_families {
    match store.get_family(*family_id).await? {
      Some(f) => parent_families.push(f),
      None => warn!(family = %family_id, "parent family is missing"),
    }
  }

  Ok(PersonView { person, spouse_families, parent_families })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
