//! Error types and SNAFU context selectors for `registry`.
//!
//! This module centralizes the `RegistryError` enum used by the public API
//! and exposes context selectors (via `#[snafu(visibility(pub(crate)))]`) so
//! the write and read paths can attach error context without re-exporting
//! everything at the crate root. Keep new variants here to ensure consistent
//! user-facing messages.

use snafu::prelude::*;

use crate::catalog::CableId;
use crate::ledger::CommitError;
use crate::validity::{OverlapConflict, RecordId, SelectionError};

/// Errors from registry operations.
///
/// Write rejections (validation, overlap, open-version, conflict) are
/// expected, recoverable conditions for the caller to surface to the user;
/// none are retried internally.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RegistryError {
    /// Any error from the ledger / commit machinery. A `Conflict` inside
    /// means another writer committed between this operation's check and its
    /// write; the caller may reload and retry the whole sequence.
    #[snafu(display("Ledger error: {source}"))]
    Ledger {
        /// Underlying ledger error.
        source: CommitError,
    },

    /// Attempting to open a registry that has no commits at all.
    #[snafu(display("Cannot open registry with no commits (CURRENT version is 0)"))]
    EmptyRegistry,

    /// Attempting to create a registry where commits already exist.
    #[snafu(display("Registry already exists; current ledger version is {current_version}"))]
    AlreadyExists {
        /// Current ledger version that indicates the registry already exists.
        current_version: u64,
    },

    /// A payload field that must be strictly positive is not.
    #[snafu(display("{field} must be > 0 (got {value})"))]
    NonPositiveValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A strand count that must be strictly positive is zero.
    #[snafu(display("{field} must be > 0"))]
    ZeroStrandCount {
        /// Name of the offending count field.
        field: &'static str,
    },

    /// More strands active than installed.
    #[snafu(display("strands_active ({active}) must not exceed strands_total ({total})"))]
    StrandCountExceeded {
        /// Strands carrying load.
        active: u32,
        /// Strands installed.
        total: u32,
    },

    /// Tamper guard enabled without a guarded length.
    #[snafu(display("Tamper guard on {cable} requires a guard length"))]
    GuardLengthRequired {
        /// Cable whose candidate was rejected.
        cable: CableId,
    },

    /// Tamper-guard length must be strictly positive.
    #[snafu(display("Tamper-guard length on {cable} must be > 0 (got {guard_length_m})"))]
    GuardLengthNonPositive {
        /// Cable whose candidate was rejected.
        cable: CableId,
        /// The rejected guard length.
        guard_length_m: f64,
    },

    /// Tamper-guard length cannot exceed the effective length.
    #[snafu(display(
        "Tamper-guard length on {cable} ({guard_length_m} m) exceeds effective length ({length_effective_m} m)"
    ))]
    GuardLengthExceedsEffective {
        /// Cable whose candidate was rejected.
        cable: CableId,
        /// The rejected guard length.
        guard_length_m: f64,
        /// The version's effective length.
        length_effective_m: f64,
    },

    /// Candidate is open-ended but the cable already has an open-ended
    /// version. Two simultaneous open windows would make every future
    /// covering-phase lookup ambiguous, so this is rejected before the
    /// general overlap scan with its own message.
    #[snafu(display(
        "An open-ended state version ({existing}) already exists for {cable}; close it before registering another"
    ))]
    OpenVersionExists {
        /// Cable whose candidate was rejected.
        cable: CableId,
        /// Id of the open-ended version already registered.
        existing: RecordId,
    },

    /// Candidate's validity window intersects an existing record's window.
    #[snafu(transparent)]
    Overlap {
        /// The conflict, naming the existing record.
        source: OverlapConflict,
    },

    /// No unambiguous cable state version for the query instant.
    #[snafu(display("Cannot resolve state version for {cable}: {source}"))]
    StateSelection {
        /// Cable queried.
        cable: CableId,
        /// Underlying selection failure.
        source: SelectionError,
    },

    /// No unambiguous stiffness calibration for the query instant.
    #[snafu(display("Cannot resolve calibration for {cable}: {source}"))]
    CalibrationSelection {
        /// Cable queried.
        cable: CableId,
        /// Underlying selection failure.
        source: SelectionError,
    },
}
