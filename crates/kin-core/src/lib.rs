//! Person-merge engine for a genealogical record store.
//!
//! Fuses two Person records that describe the same individual and reconciles
//! every Family that referenced either of them, inside one transaction
//! against a caller-supplied [`store::RecordStore`].
//!
//! Backends live in their own crates; this one has no database or CLI
//! dependencies.

pub mod ancestry;
pub mod error;
pub mod family;
pub mod fields;
pub mod id;
pub mod memory;
pub mod merge;
pub mod person;
pub mod policy;
pub mod precheck;
pub mod reconcile;
pub mod report;
pub mod staging;
pub mod store;
pub mod value;

pub use error::{MergeError, Result};
pub use merge::{check_merge, merge, plan_merge};
pub use report::MergeReport;

#[cfg(test)]
mod tests;
