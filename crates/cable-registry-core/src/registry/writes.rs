//! Write path: validate a candidate, then commit.
//!
//! Guard order for a cable state version (each failure is a distinct error):
//! 1. payload rules (positive lengths/masses, strand counts, tamper guard),
//! 2. open-version pre-check, the cheap special case of the overlap rule,
//! 3. general closed-interval overlap scan against the cable's versions.
//!
//! Calibrations and installations run their payload guard plus the same
//! overlap scan over their own owner key (cable and sensor respectively).
//! Overlap semantics are closed-interval for all three kinds: windows that
//! touch at a boundary instant conflict.
//!
//! The commit uses the in-memory state's version as the expected version, so
//! the whole check-then-commit sequence fails with a ledger conflict when a
//! concurrent writer got in between; the caller may `refresh` and retry.

use snafu::prelude::*;

use crate::catalog::{CableStateVersion, KCalibration, SensorInstallation};
use crate::ledger::LogAction;
use crate::registry::error::{
    GuardLengthExceedsEffectiveSnafu, GuardLengthNonPositiveSnafu, GuardLengthRequiredSnafu,
    LedgerSnafu, NonPositiveValueSnafu, OpenVersionExistsSnafu, StrandCountExceededSnafu,
    ZeroStrandCountSnafu,
};
use crate::registry::{Registry, RegistryError};
use crate::validity::{ensure_no_overlap, find_open, RecordId};

fn ensure_positive(field: &'static str, value: f64) -> Result<(), RegistryError> {
    ensure!(value > 0.0, NonPositiveValueSnafu { field, value });
    Ok(())
}

fn validate_cable_state(candidate: &CableStateVersion) -> Result<(), RegistryError> {
    ensure_positive("length_effective_m", candidate.length_effective_m)?;
    ensure_positive("mu_total_kg_m", candidate.mu_total_kg_m)?;
    ensure_positive("mu_active_kg_m", candidate.mu_active_kg_m)?;
    ensure_positive("design_tension_tf", candidate.design_tension_tf)?;
    ensure_positive("strand_fu_default_mpa", candidate.strand_fu_default_mpa)?;

    ensure!(
        candidate.strands_total > 0,
        ZeroStrandCountSnafu {
            field: "strands_total"
        }
    );
    ensure!(
        candidate.strands_active > 0,
        ZeroStrandCountSnafu {
            field: "strands_active"
        }
    );
    ensure!(
        candidate.strands_active <= candidate.strands_total,
        StrandCountExceededSnafu {
            active: candidate.strands_active,
            total: candidate.strands_total,
        }
    );

    if candidate.guard_enabled {
        match candidate.guard_length_m {
            None => {
                return GuardLengthRequiredSnafu {
                    cable: candidate.cable_id,
                }
                .fail();
            }
            Some(len) if len <= 0.0 => {
                return GuardLengthNonPositiveSnafu {
                    cable: candidate.cable_id,
                    guard_length_m: len,
                }
                .fail();
            }
            Some(len) if len > candidate.length_effective_m => {
                return GuardLengthExceedsEffectiveSnafu {
                    cable: candidate.cable_id,
                    guard_length_m: len,
                    length_effective_m: candidate.length_effective_m,
                }
                .fail();
            }
            Some(_) => {}
        }
    }

    Ok(())
}

impl Registry {
    async fn commit_one(&mut self, action: LogAction) -> Result<u64, RegistryError> {
        self.store
            .commit_with_expected_version(self.state.version, vec![action])
            .await
            .context(LedgerSnafu)
    }

    /// Register a new cable state version.
    ///
    /// Runs the payload guards, the open-version pre-check, and the overlap
    /// scan before committing. Returns the id assigned to the record.
    pub async fn register_cable_state(
        &mut self,
        candidate: CableStateVersion,
    ) -> Result<RecordId, RegistryError> {
        validate_cable_state(&candidate)?;

        let existing = self.state.cable_states_for(candidate.cable_id);
        if candidate.window.is_open() {
            if let Some(open) = find_open(existing) {
                return OpenVersionExistsSnafu {
                    cable: candidate.cable_id,
                    existing: open.id,
                }
                .fail();
            }
        }
        ensure_no_overlap(existing, candidate.window, None)?;

        let version = self
            .commit_one(LogAction::AddCableState(candidate.clone()))
            .await?;
        self.state.version = version;
        Ok(self.state.add_cable_state(candidate))
    }

    /// Register a new stiffness calibration for a cable.
    pub async fn register_calibration(
        &mut self,
        candidate: KCalibration,
    ) -> Result<RecordId, RegistryError> {
        ensure_positive("k_value", candidate.k_value)?;

        let existing = self.state.calibrations_for(candidate.cable_id);
        ensure_no_overlap(existing, candidate.window, None)?;

        let version = self
            .commit_one(LogAction::AddCalibration(candidate.clone()))
            .await?;
        self.state.version = version;
        Ok(self.state.add_calibration(candidate))
    }

    /// Register a new sensor installation.
    ///
    /// The owner key is the sensor: one sensor cannot be mounted on two
    /// cables over intersecting windows.
    pub async fn register_installation(
        &mut self,
        candidate: SensorInstallation,
    ) -> Result<RecordId, RegistryError> {
        ensure_positive("height_m", candidate.height_m)?;

        let existing = self.state.installations_for(candidate.sensor_id);
        ensure_no_overlap(existing, candidate.window, None)?;

        let version = self
            .commit_one(LogAction::AddInstallation(candidate.clone()))
            .await?;
        self.state.version = version;
        Ok(self.state.add_installation(candidate))
    }
}
