//! Reconstructing registry state by replaying log commits.
//!
//! [`RegistryState`] materializes the records stored in `_registry_log/`.
//! [`LedgerStore::rebuild_state`] walks all commits from version 1 up to the
//! `CURRENT` pointer, applying their actions in order. Record ids are the
//! running count of records added, so ids are dense, start at 1, and ascend
//! in commit order. The per-owner vectors below are therefore sorted by id,
//! which the fallback tie-break in [`crate::validity::select_at`] relies on.

use std::collections::HashMap;

use crate::catalog::{CableId, CableStateVersion, KCalibration, SensorId, SensorInstallation};
use crate::ledger::actions::{LogAction, RegistryMeta};
use crate::ledger::store::LedgerStore;
use crate::ledger::{CommitError, CorruptStateSnafu};
use crate::validity::{RecordId, Registered};
use snafu::prelude::*;

/// In-memory view of all committed records, grouped by owning entity.
///
/// Invariant:
/// - `version` matches the CURRENT pointer at rebuild time.
/// - Every per-owner vector is ordered by ascending record id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryState {
    /// Latest committed version recorded in CURRENT.
    pub version: u64,
    /// Registry metadata from the `Init` action (last one wins).
    pub meta: Option<RegistryMeta>,
    /// Cable state versions keyed by cable.
    pub cable_states: HashMap<CableId, Vec<Registered<CableStateVersion>>>,
    /// Stiffness calibrations keyed by cable.
    pub calibrations: HashMap<CableId, Vec<Registered<KCalibration>>>,
    /// Sensor installations keyed by sensor.
    pub installations: HashMap<SensorId, Vec<Registered<SensorInstallation>>>,
    /// Records added across the whole log; the next record gets id
    /// `records_total + 1`.
    pub records_total: u64,
}

impl RegistryState {
    /// Cable state versions for one cable, empty when none are registered.
    pub fn cable_states_for(&self, cable: CableId) -> &[Registered<CableStateVersion>] {
        self.cable_states.get(&cable).map_or(&[], Vec::as_slice)
    }

    /// Calibrations for one cable, empty when none are registered.
    pub fn calibrations_for(&self, cable: CableId) -> &[Registered<KCalibration>] {
        self.calibrations.get(&cable).map_or(&[], Vec::as_slice)
    }

    /// Installations for one sensor, empty when none are registered.
    pub fn installations_for(&self, sensor: SensorId) -> &[Registered<SensorInstallation>] {
        self.installations.get(&sensor).map_or(&[], Vec::as_slice)
    }

    fn next_record_id(&mut self) -> RecordId {
        self.records_total += 1;
        RecordId(self.records_total)
    }

    /// Append a cable state version, assigning the next record id.
    pub(crate) fn add_cable_state(&mut self, record: CableStateVersion) -> RecordId {
        let id = self.next_record_id();
        self.cable_states
            .entry(record.cable_id)
            .or_default()
            .push(Registered { id, record });
        id
    }

    /// Append a calibration, assigning the next record id.
    pub(crate) fn add_calibration(&mut self, record: KCalibration) -> RecordId {
        let id = self.next_record_id();
        self.calibrations
            .entry(record.cable_id)
            .or_default()
            .push(Registered { id, record });
        id
    }

    /// Append an installation, assigning the next record id.
    pub(crate) fn add_installation(&mut self, record: SensorInstallation) -> RecordId {
        let id = self.next_record_id();
        self.installations
            .entry(record.sensor_id)
            .or_default()
            .push(Registered { id, record });
        id
    }

    /// Apply one action to the in-memory state, assigning record ids in
    /// replay order.
    pub(crate) fn apply(&mut self, action: LogAction) {
        match action {
            LogAction::Init(meta) => {
                self.meta = Some(meta);
            }
            LogAction::AddCableState(record) => {
                self.add_cable_state(record);
            }
            LogAction::AddCalibration(record) => {
                self.add_calibration(record);
            }
            LogAction::AddInstallation(record) => {
                self.add_installation(record);
            }
        }
    }
}

impl LedgerStore {
    /// Rebuild the current RegistryState by replaying all commits up to
    /// CURRENT.
    ///
    /// - If CURRENT == 0 (no commits), returns `CommitError::CorruptState`;
    ///   opening an uninitialized registry is a caller error surfaced by the
    ///   registry layer before reaching here.
    /// - The first commit must carry an `Init` action; the last `Init` wins.
    pub async fn rebuild_state(&self) -> Result<RegistryState, CommitError> {
        let current_version = self.load_current_version().await?;

        if current_version == 0 {
            return CorruptStateSnafu {
                msg: "Cannot rebuild RegistryState: CURRENT is 0 (no commits)".to_string(),
            }
            .fail();
        }

        let mut state = RegistryState::default();

        for v in 1..=current_version {
            let commit = self.load_commit(v).await?;

            // Defensive: file name version should match payload.
            if commit.version != v {
                return CorruptStateSnafu {
                    msg: format!(
                        "Commit version mismatch: expected {v}, found {} in payload",
                        commit.version
                    ),
                }
                .fail();
            }

            for action in commit.actions {
                state.apply(action);
            }
        }

        ensure!(
            state.meta.is_some(),
            CorruptStateSnafu {
                msg: format!("No Init action found in commits up to version {current_version}"),
            }
        );

        state.version = current_version;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::storage::RegistryLocation;
    use crate::validity::ValidityWindow;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn create_test_store() -> (TempDir, LedgerStore) {
        let tmp = TempDir::new().expect("create temp dir");
        let store = LedgerStore::new(RegistryLocation::local(tmp.path()));
        (tmp, store)
    }

    fn sample_calibration(cable: u64, month: u32) -> KCalibration {
        KCalibration {
            cable_id: CableId(cable),
            window: ValidityWindow::open(
                Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0)
                    .single()
                    .expect("valid timestamp"),
            ),
            k_value: 0.5,
            algorithm_version: "1.0.0".to_string(),
            weighing_measurement_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn rebuild_replays_records_in_commit_order() -> TestResult {
        let (_tmp, store) = create_test_store();

        let v1 = store
            .commit_with_expected_version(0, vec![LogAction::Init(RegistryMeta::new())])
            .await?;
        let v2 = store
            .commit_with_expected_version(
                v1,
                vec![LogAction::AddCalibration(sample_calibration(1, 1))],
            )
            .await?;
        store
            .commit_with_expected_version(
                v2,
                vec![LogAction::AddCalibration(sample_calibration(2, 2))],
            )
            .await?;

        let state = store.rebuild_state().await?;

        assert_eq!(state.version, 3);
        assert_eq!(state.records_total, 2);
        assert_eq!(state.calibrations_for(CableId(1))[0].id, RecordId(1));
        assert_eq!(state.calibrations_for(CableId(2))[0].id, RecordId(2));
        assert!(state.meta.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn rebuild_errors_when_current_zero() -> TestResult {
        let (_tmp, store) = create_test_store();

        let err = store.rebuild_state().await.expect_err("no commits");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn rebuild_errors_without_init() -> TestResult {
        let (_tmp, store) = create_test_store();

        store
            .commit_with_expected_version(
                0,
                vec![LogAction::AddCalibration(sample_calibration(1, 1))],
            )
            .await?;

        let err = store.rebuild_state().await.expect_err("missing Init");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn records_for_unknown_owner_are_empty() {
        let state = RegistryState::default();
        assert!(state.cable_states_for(CableId(9)).is_empty());
        assert!(state.calibrations_for(CableId(9)).is_empty());
        assert!(state.installations_for(SensorId(9)).is_empty());
    }
}
