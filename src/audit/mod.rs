//! Audit logging for price changes
//!
//! Every price written by the catalog updater or the reconciliation engine is
//! recorded with before/after snapshots in an append-only JSONL file.
//!
//! - `AuditEntry`: one recorded change
//! - `AuditLogger`: appends entries and reads them back
//! - `generate_diff`: one-line summary of what changed

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
