//! Core engine for a versioned stay-cable record registry.
//!
//! This crate provides the foundational pieces for `cable-registry`:
//!
//! - Temporal validity resolution over time-ranged records: selecting the
//!   single record effective at a query instant, and rejecting candidate
//!   records whose validity window conflicts with existing ones
//!   (`validity` module).
//! - Strongly-typed catalog records for the three time-ranged kinds: cable
//!   state versions, stiffness calibrations, and sensor installations
//!   (`catalog` module).
//! - An append-only, JSON-encoded commit ledger with a `CURRENT` pointer and
//!   version-guard optimistic concurrency control (`ledger` module).
//! - A `Registry` facade that runs the write-time guards and read-time
//!   selection over the replayed ledger state (`registry` module).
//! - Tension derivation from fundamental frequency and stiffness
//!   calibration, plus threshold ("semaphore") evaluation
//!   (`analysis` module).
//!
//! Higher-level integration (a CLI, an HTTP API) is expected to depend on
//! this core crate rather than re-implement the validity and ledger logic.
#![deny(missing_docs)]
pub mod analysis;
pub mod catalog;
pub mod ledger;
pub mod registry;
pub mod validity;

pub use analysis::{SemaphoreReport, SemaphoreStatus, TensionReading, ALERT_THRESHOLD_PCT};
pub use catalog::{CableId, CableStateVersion, KCalibration, SensorId, SensorInstallation};
pub use ledger::{CommitError, RegistryLocation};
pub use registry::{CableTension, Registry, RegistryError};
pub use validity::{RecordId, Registered, SelectionError, StoredOverlap, ValidityWindow};
