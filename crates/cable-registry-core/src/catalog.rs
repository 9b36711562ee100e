//! Typed record payloads committed to the registry ledger.
//!
//! Three record kinds realize the time-ranged shape, one per owning entity
//! domain:
//!
//! - [`CableStateVersion`]: a cable's physical configuration (owner: cable).
//! - [`KCalibration`]: a stiffness calibration constant (owner: cable).
//! - [`SensorInstallation`]: a sensor mounted on a cable (owner: sensor).
//!
//! Payload fields are opaque to the selection/overlap engine in
//! [`crate::validity`]; only the embedded [`ValidityWindow`] participates.
//! Payload-level business rules (positive lengths, tamper-guard bounds,
//! positive k) are enforced by the registry at the write boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validity::{TimeRanged, ValidityWindow};

/// Identifier of a cable in the bridge catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CableId(pub u64);

impl fmt::Display for CableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cable {}", self.0)
    }
}

/// Identifier of a physical sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SensorId(pub u64);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor {}", self.0)
    }
}

/// One immutable version of a cable's physical configuration.
///
/// A new version is registered whenever the cable is modified (strand
/// replacement, length change, tamper-guard sleeve work); the previous
/// version's window is closed and the new one takes over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableStateVersion {
    /// Cable this version describes.
    pub cable_id: CableId,
    /// Validity window of this version.
    pub window: ValidityWindow,
    /// Effective (vibrating) length in meters.
    pub length_effective_m: f64,
    /// Total anchorage-to-anchorage length in meters, if surveyed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_total_m: Option<f64>,
    /// Strands installed in the cable.
    pub strands_total: u32,
    /// Strands currently carrying load.
    pub strands_active: u32,
    /// Strands present but decommissioned.
    #[serde(default)]
    pub strands_inactive: u32,
    /// Strand diameter in millimeters.
    pub strand_diameter_mm: f64,
    /// Strand cross-section area in square millimeters.
    pub strand_area_mm2: f64,
    /// Elastic modulus in MPa.
    pub e_modulus_mpa: f64,
    /// Linear mass of the full cross-section in kg/m.
    pub mu_total_kg_m: f64,
    /// Linear mass counting active strands only, in kg/m.
    pub mu_active_kg_m: f64,
    /// Design tension in tonnes-force.
    pub design_tension_tf: f64,
    /// Measured ultimate strength override in MPa, when a test supersedes
    /// the strand-type default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fu_override_mpa: Option<f64>,
    /// Ultimate strength default of the strand type, in MPa.
    pub strand_fu_default_mpa: f64,
    /// Whether a tamper-guard sleeve is fitted at the lower anchorage.
    #[serde(default)]
    pub guard_enabled: bool,
    /// Sleeved length in meters; required when the guard is fitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_length_m: Option<f64>,
    /// Free-text provenance notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CableStateVersion {
    /// Ultimate strength applicable to this version: the measured override
    /// when present, the strand-type default otherwise.
    pub fn effective_fu(&self) -> f64 {
        self.fu_override_mpa.unwrap_or(self.strand_fu_default_mpa)
    }
}

impl TimeRanged for CableStateVersion {
    fn window(&self) -> ValidityWindow {
        self.window
    }
}

/// Stiffness calibration constant relating fundamental frequency to tension.
///
/// `tension_tf = f0_hz^2 * k_value`; see [`crate::analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KCalibration {
    /// Cable this calibration applies to.
    pub cable_id: CableId,
    /// Validity window of the constant.
    pub window: ValidityWindow,
    /// The calibration constant. Strictly positive.
    pub k_value: f64,
    /// Version of the derivation algorithm that produced the constant.
    pub algorithm_version: String,
    /// Direct-weighing measurement the constant was derived from, if tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighing_measurement_id: Option<u64>,
    /// Free-text provenance notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimeRanged for KCalibration {
    fn window(&self) -> ValidityWindow {
        self.window
    }
}

/// A sensor mounted on a cable for some period.
///
/// The owning entity is the *sensor*: one sensor cannot sit on two cables at
/// once, so installation windows must not overlap per sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInstallation {
    /// The mounted sensor.
    pub sensor_id: SensorId,
    /// Cable the sensor is mounted on.
    pub cable_id: CableId,
    /// Installation window.
    pub window: ValidityWindow,
    /// Mounting height above the deck anchorage, in meters. Strictly positive.
    pub height_m: f64,
    /// Free-text mounting notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimeRanged for SensorInstallation {
    fn window(&self) -> ValidityWindow {
        self.window
    }
}
