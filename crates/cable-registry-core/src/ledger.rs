//! Append-only record ledger and registry state.
//!
//! The ledger is the durable store behind the registry: every accepted
//! record registration becomes a commit in an append-only JSON log under the
//! registry root.
//!
//! - A simple append-only commit log stored as JSON files under a
//!   `_registry_log/` directory (for example, `_registry_log/0000000001.json`).
//! - A `CURRENT` pointer that tracks the latest committed version.
//! - Strongly-typed actions, one per record kind, plus an `Init` action that
//!   bootstraps the registry metadata.
//! - An optimistic concurrency model based on version guards, so commits
//!   fail cleanly with a conflict error when the expected version does not
//!   match the current version. This is the "concurrent modification"
//!   failure surfaced by the registry's check-then-commit sequence: two
//!   writers racing past the same overlap check cannot both win the commit.
//! - A [`RegistryState`] materialized from the log, grouping records by
//!   owning entity key with ids assigned in commit order.
//!
//! ## On-disk layout
//!
//! ```text
//! registry_root/
//!   _registry_log/
//!     CURRENT                  # latest committed version (e.g. "3\n")
//!     0000000001.json          # Commit version 1 (Init)
//!     0000000002.json          # Commit version 2
//!     0000000003.json          # Commit version 3
//! ```
//!
//! Each `*.json` file contains a single [`Commit`] value. The log is strictly
//! append-only; state is reconstructed by replaying every commit up to the
//! version referenced by `CURRENT`.

pub mod actions;
pub mod state;
pub mod storage;
pub mod store;

pub use actions::{Commit, LogAction, RegistryMeta, REGISTRY_FORMAT_VERSION};
pub use state::RegistryState;
pub use storage::{RegistryLocation, StorageError};
pub use store::LedgerStore;

use snafu::{prelude::*, Backtrace};

/// Errors that can occur while reading or writing the commit log.
#[derive(Debug, Snafu)]
pub enum CommitError {
    /// The caller's expected version does not match the CURRENT pointer:
    /// another writer committed first. The caller may reload and re-run its
    /// whole read-check-write sequence; the ledger never retries.
    #[snafu(display("Commit conflict: expected version {expected}, but CURRENT is {found}"))]
    Conflict {
        /// The version the caller expected to be current.
        expected: u64,
        /// The actual current version found.
        found: u64,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Underlying storage error while working with the log or CURRENT file.
    #[snafu(display("Storage error while accessing commit log: {source}"))]
    Storage {
        /// Underlying storage error returned by the storage layer.
        source: StorageError,
    },

    /// The log or CURRENT file is in an unexpected / malformed state.
    #[snafu(display("Corrupt ledger state: {msg}"))]
    CorruptState {
        /// A description of the corrupt state.
        msg: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}
