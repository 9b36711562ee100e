//! Async persistence of the commit log.
//!
//! This module owns all on-disk interactions with `_registry_log/`:
//!
//! - Tracking the `CURRENT` pointer and interpreting the "no file" case as
//!   version `0` (fresh registry).
//! - Writing zero-padded commit files with optimistic concurrency control so
//!   each version is created exactly once.
//! - Mapping storage failures into [`CommitError`] variants so callers can
//!   differentiate conflicts, storage errors, and corrupt state.

use chrono::Utc;
use snafu::{prelude::*, Backtrace};
use std::path::{Path, PathBuf};

use crate::ledger::actions::{Commit, LogAction};
use crate::ledger::storage::{self, RegistryLocation, StorageError};
use crate::ledger::{CommitError, ConflictSnafu, CorruptStateSnafu};

/// Helper for reading and writing the commit log under a registry root.
///
/// Layout:
///   <root>/_registry_log/0000000001.json
///   <root>/_registry_log/0000000002.json
///   <root>/_registry_log/CURRENT
#[derive(Debug, Clone)]
pub struct LedgerStore {
    location: RegistryLocation,
}

impl LedgerStore {
    /// Name of the subdirectory containing the commit log.
    pub const LOG_DIR_NAME: &'static str = "_registry_log";
    /// Name of the file that stores the current version pointer.
    pub const CURRENT_FILE_NAME: &'static str = "CURRENT";
    /// Number of digits used in zero-padded commit file names.
    pub const COMMIT_FILENAME_DIGITS: usize = 10;

    /// Create a new LedgerStore rooted at a registry directory.
    pub fn new(location: RegistryLocation) -> Self {
        Self { location }
    }

    /// The registry root this store operates on.
    pub fn location(&self) -> &RegistryLocation {
        &self.location
    }

    fn log_rel_dir() -> PathBuf {
        PathBuf::from(Self::LOG_DIR_NAME)
    }

    fn current_rel_path() -> PathBuf {
        Self::log_rel_dir().join(Self::CURRENT_FILE_NAME)
    }

    fn commit_rel_path(version: u64) -> PathBuf {
        let file_name = format!(
            "{:0width$}.json",
            version,
            width = Self::COMMIT_FILENAME_DIGITS
        );
        Self::log_rel_dir().join(file_name)
    }

    async fn read_to_string_rel(&self, rel: &Path) -> Result<String, CommitError> {
        storage::read_to_string(&self.location, rel)
            .await
            .map_err(|source| CommitError::Storage { source })
    }

    /// Load a single commit by version.
    ///
    /// - On storage failures, returns `CommitError::Storage`.
    /// - On JSON parse failures, returns `CommitError::CorruptState`.
    pub async fn load_commit(&self, version: u64) -> Result<Commit, CommitError> {
        let rel = Self::commit_rel_path(version);
        let json = self.read_to_string_rel(&rel).await?;

        let commit = serde_json::from_str(&json).map_err(|e| CommitError::CorruptState {
            msg: format!("failed to parse commit {version}: {e}"),
            backtrace: Backtrace::capture(),
        })?;

        Ok(commit)
    }

    /// Load the CURRENT version pointer.
    ///
    /// - If CURRENT does not exist, treat as a fresh registry and return 0.
    /// - If CURRENT contains invalid or empty content, return CorruptState.
    pub async fn load_current_version(&self) -> Result<u64, CommitError> {
        let rel = Self::current_rel_path();

        let contents = match storage::read_to_string(&self.location, &rel).await {
            Ok(s) => s,
            Err(StorageError::NotFound { .. }) => return Ok(0),
            Err(source) => return Err(CommitError::Storage { source }),
        };

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return CorruptStateSnafu {
                msg: format!("CURRENT has empty content at {rel:?}"),
            }
            .fail();
        }
        let version = trimmed
            .parse::<u64>()
            .map_err(|e| CommitError::CorruptState {
                msg: format!("CURRENT has invalid content {trimmed:?}: {e}"),
                backtrace: Backtrace::capture(),
            })?;

        Ok(version)
    }

    /// Commit a new version with an optimistic concurrency guard.
    ///
    /// The check on CURRENT is advisory and subject to races: two writers may
    /// both read the same CURRENT value and attempt the same next version.
    /// The actual guard is the create-only commit file write: the loser of
    /// the race fails with `StorageError::AlreadyExists`, which callers
    /// surface like a conflict (reload, re-check, re-commit if still valid).
    ///
    /// If this method creates the commit file but fails before updating
    /// CURRENT, the orphaned commit file is harmless: readers only consider
    /// commits up to the version in CURRENT, and a later writer of the same
    /// version will observe `AlreadyExists` and reload.
    pub async fn commit_with_expected_version(
        &self,
        expected: u64,
        actions: Vec<LogAction>,
    ) -> Result<u64, CommitError> {
        let current = self.load_current_version().await?;
        if current != expected {
            return ConflictSnafu {
                expected,
                found: current,
            }
            .fail();
        }

        let version = expected.checked_add(1).context(CorruptStateSnafu {
            msg: "version counter overflow".to_string(),
        })?;

        let commit = Commit {
            version,
            base_version: expected,
            timestamp: Utc::now(),
            actions,
        };

        let json = serde_json::to_vec(&commit).map_err(|e| CommitError::CorruptState {
            msg: format!("failed to serialize commit {version}: {e}"),
            backtrace: Backtrace::capture(),
        })?;

        let commit_rel = Self::commit_rel_path(version);
        storage::write_new(&self.location, &commit_rel, &json)
            .await
            .map_err(|source| CommitError::Storage { source })?;

        let current_rel = Self::current_rel_path();
        let current_contents = format!("{version}\n");
        storage::write_atomic(&self.location, &current_rel, current_contents.as_bytes())
            .await
            .map_err(|source| CommitError::Storage { source })?;

        Ok(version)
    }
}
