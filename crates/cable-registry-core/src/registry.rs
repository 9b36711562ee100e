//! Registry facade: the call boundary over the ledger and the validity core.
//!
//! A [`Registry`] holds a replayed [`RegistryState`] and a [`LedgerStore`].
//! Write operations validate a candidate against the in-memory state (payload
//! guards, open-version pre-check, overlap scan) and then commit with the
//! state's version as the expected version, so a concurrent writer who
//! committed in between surfaces as a ledger conflict rather than a silently
//! corrupted history. Read operations resolve the effective record at a query
//! instant via [`crate::validity::select_at`].
//!
//! Registration and selection are split across the `writes` and `reads`
//! submodules; lifecycle (create/open/refresh) lives here.

pub mod error;
mod reads;
mod writes;

pub use error::RegistryError;
pub use reads::CableTension;

use snafu::prelude::*;

use crate::ledger::{LedgerStore, LogAction, RegistryLocation, RegistryMeta, RegistryState};
use crate::registry::error::{AlreadyExistsSnafu, EmptyRegistrySnafu, LedgerSnafu};

/// Versioned record registry for one installation (one bridge stock).
#[derive(Debug)]
pub struct Registry {
    store: LedgerStore,
    state: RegistryState,
}

impl Registry {
    /// Create a fresh registry at `location`.
    ///
    /// Writes the bootstrap `Init` commit. Fails with
    /// [`RegistryError::AlreadyExists`] when the location already holds
    /// commits.
    pub async fn create(location: RegistryLocation) -> Result<Self, RegistryError> {
        let store = LedgerStore::new(location);

        let current = store.load_current_version().await.context(LedgerSnafu)?;
        ensure!(
            current == 0,
            AlreadyExistsSnafu {
                current_version: current
            }
        );

        store
            .commit_with_expected_version(0, vec![LogAction::Init(RegistryMeta::new())])
            .await
            .context(LedgerSnafu)?;

        let state = store.rebuild_state().await.context(LedgerSnafu)?;
        Ok(Self { store, state })
    }

    /// Open an existing registry at `location`.
    ///
    /// Fails with [`RegistryError::EmptyRegistry`] when no commits exist.
    pub async fn open(location: RegistryLocation) -> Result<Self, RegistryError> {
        let store = LedgerStore::new(location);

        let current = store.load_current_version().await.context(LedgerSnafu)?;
        ensure!(current > 0, EmptyRegistrySnafu);

        let state = store.rebuild_state().await.context(LedgerSnafu)?;
        Ok(Self { store, state })
    }

    /// The replayed in-memory state this handle operates on.
    ///
    /// Stale once another writer commits; see [`Registry::refresh`].
    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    /// Latest committed version on disk, which may be ahead of
    /// `self.state().version` when another writer committed since this
    /// handle loaded.
    pub async fn current_version(&self) -> Result<u64, RegistryError> {
        self.store.load_current_version().await.context(LedgerSnafu)
    }

    /// Re-replay the log so this handle sees commits made by other writers.
    pub async fn refresh(&mut self) -> Result<(), RegistryError> {
        self.state = self.store.rebuild_state().await.context(LedgerSnafu)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[tokio::test]
    async fn create_then_open_roundtrip() -> TestResult {
        let tmp = TempDir::new()?;
        let location = RegistryLocation::local(tmp.path());

        let created = Registry::create(location.clone()).await?;
        assert_eq!(created.state().version, 1);
        assert!(created.state().meta.is_some());

        let opened = Registry::open(location).await?;
        assert_eq!(opened.state().version, 1);
        Ok(())
    }

    #[tokio::test]
    async fn create_refuses_existing_registry() -> TestResult {
        let tmp = TempDir::new()?;
        let location = RegistryLocation::local(tmp.path());

        Registry::create(location.clone()).await?;
        let err = Registry::create(location)
            .await
            .expect_err("second create must fail");
        assert!(matches!(
            err,
            RegistryError::AlreadyExists { current_version: 1 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn open_refuses_empty_location() -> TestResult {
        let tmp = TempDir::new()?;
        let location = RegistryLocation::local(tmp.path());

        let err = Registry::open(location).await.expect_err("nothing there");
        assert!(matches!(err, RegistryError::EmptyRegistry));
        Ok(())
    }
}
