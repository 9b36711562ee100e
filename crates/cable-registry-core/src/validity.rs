//! Temporal validity resolution over time-ranged records.
//!
//! This module is intentionally small and generic:
//!
//! - It models a validity window as a closed interval `[valid_from, valid_to]`
//!   where an absent `valid_to` means "open-ended, valid indefinitely".
//! - It does not know about cables, sensors, or storage. Callers group their
//!   records by owning entity before calling in.
//! - Selection and overlap checking are pure functions over an
//!   already-materialized slice of records.
//!
//! Two operations form the core:
//!
//! - [`select_at`] picks the single record applicable at a query instant,
//!   preferring a covering window and degrading to the latest record that had
//!   already started. Two covering windows are a data-integrity fault and are
//!   reported, never silently resolved.
//! - [`ensure_no_overlap`] rejects a candidate window that intersects any
//!   existing window for the same owner.
//!
//! Interval semantics are closed on both ends: a record is valid *through*
//! `valid_to`, and two windows that touch at a boundary instant conflict. An
//! instant can never belong to two configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

/// Identity of a committed record, assigned by the ledger in commit order.
///
/// Ids are only used for diagnostics (naming conflicting records) and for
/// excluding a record from the overlap scan when re-validating itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A record's validity window is malformed.
#[derive(Debug, Snafu)]
#[snafu(display("Invalid validity window: valid_to {to} must be after valid_from {from}"))]
pub struct InvalidWindow {
    /// Start of the rejected window.
    pub from: DateTime<Utc>,
    /// End of the rejected window.
    pub to: DateTime<Utc>,
}

/// Closed validity interval `[valid_from, valid_to]`, open-ended when
/// `valid_to` is absent.
///
/// Invariant: when both bounds are present, `valid_to > valid_from` strictly.
/// The constructors enforce this; a window read back from the ledger was
/// validated when it was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    valid_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_to: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Build a window, enforcing the strict `valid_to > valid_from` invariant.
    pub fn new(
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> Result<Self, InvalidWindow> {
        if let Some(to) = valid_to {
            ensure!(to > valid_from, InvalidWindowSnafu { from: valid_from, to });
        }
        Ok(Self {
            valid_from,
            valid_to,
        })
    }

    /// Open-ended window starting at `valid_from`.
    pub fn open(valid_from: DateTime<Utc>) -> Self {
        Self {
            valid_from,
            valid_to: None,
        }
    }

    /// Bounded window `[valid_from, valid_to]`.
    pub fn bounded(
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> Result<Self, InvalidWindow> {
        Self::new(valid_from, Some(valid_to))
    }

    /// Inclusive start instant.
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// Inclusive end instant, `None` when open-ended.
    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    /// Whether this window has no end.
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Whether `at` lies inside the closed interval.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        if self.valid_from > at {
            return false;
        }
        match self.valid_to {
            Some(to) => to >= at,
            None => true,
        }
    }

    /// Closed-interval intersection test.
    ///
    /// Two windows intersect iff `a.from <= b.end && b.from <= a.end`, where
    /// an absent end behaves as +infinity. Windows touching at a single
    /// boundary instant count as intersecting.
    pub fn intersects(&self, other: &ValidityWindow) -> bool {
        let starts_before_other_ends = match other.valid_to {
            Some(end) => self.valid_from <= end,
            None => true,
        };
        let other_starts_before_self_ends = match self.valid_to {
            Some(end) => other.valid_from <= end,
            None => true,
        };
        starts_before_other_ends && other_starts_before_self_ends
    }
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.valid_to {
            Some(to) => write!(f, "[{} .. {}]", self.valid_from, to),
            None => write!(f, "[{} .. open)", self.valid_from),
        }
    }
}

/// Anything carrying a validity window.
///
/// The three catalog record kinds implement this; selection and overlap
/// checking are written once against it.
pub trait TimeRanged {
    /// The record's validity window.
    fn window(&self) -> ValidityWindow;
}

/// A committed record paired with its ledger-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registered<T> {
    /// Ledger-assigned record identity.
    pub id: RecordId,
    /// The record payload.
    pub record: T,
}

/// Failures of [`select_at`].
#[derive(Debug, Snafu)]
pub enum SelectionError {
    /// More than one window covers the query instant. Overlapping windows
    /// should have been rejected at write time, so this is a data-integrity
    /// fault and is never resolved by picking one.
    #[snafu(display(
        "Multiple records cover {at}: {} (overlapping windows in stored data)",
        display_ids(record_ids)
    ))]
    AmbiguousSelection {
        /// The query instant.
        at: DateTime<Utc>,
        /// Ids of every covering record, in stored order.
        record_ids: Vec<RecordId>,
    },

    /// No record starts at or before the query instant.
    #[snafu(display("No record starts at or before {at}"))]
    NoRecordBefore {
        /// The query instant.
        at: DateTime<Utc>,
    },
}

fn display_ids(ids: &[RecordId]) -> String {
    let rendered: Vec<String> = ids.iter().map(RecordId::to_string).collect();
    rendered.join(", ")
}

/// Select the single record applicable at `at`.
///
/// Two phases, deterministic:
///
/// 1. **Covering**: records whose window contains `at`. Exactly one wins;
///    more than one fails with [`SelectionError::AmbiguousSelection`].
/// 2. **Fallback** (covering empty): among records with `valid_from <= at`,
///    the one with the latest `valid_from`, i.e. the best known prior state
///    when a window was closed early or the query falls in a gap. Empty
///    fails with [`SelectionError::NoRecordBefore`].
///
/// Fallback ties on `valid_from` cannot occur for ledger-resident data (the
/// overlap validator rejects them at write time); if imported data produces
/// one, the record latest in stored order (highest id) wins and a warning is
/// logged.
pub fn select_at<'a, T: TimeRanged>(
    records: &'a [Registered<T>],
    at: DateTime<Utc>,
) -> Result<&'a Registered<T>, SelectionError> {
    let covering: Vec<&Registered<T>> = records
        .iter()
        .filter(|r| r.record.window().covers(at))
        .collect();

    match covering.as_slice() {
        [single] => return Ok(*single),
        [] => {}
        many => {
            return AmbiguousSelectionSnafu {
                at,
                record_ids: many.iter().map(|r| r.id).collect::<Vec<_>>(),
            }
            .fail();
        }
    }

    let mut best: Option<&Registered<T>> = None;
    let mut tied = false;
    for candidate in records
        .iter()
        .filter(|r| r.record.window().valid_from() <= at)
    {
        match best {
            None => best = Some(candidate),
            Some(current) => {
                let current_from = current.record.window().valid_from();
                let candidate_from = candidate.record.window().valid_from();
                if candidate_from > current_from {
                    best = Some(candidate);
                    tied = false;
                } else if candidate_from == current_from {
                    best = Some(candidate);
                    tied = true;
                }
            }
        }
    }

    match best {
        Some(found) => {
            if tied {
                log::warn!(
                    "fallback selection at {at} found records sharing valid_from {}; picked {}",
                    found.record.window().valid_from(),
                    found.id
                );
            }
            Ok(found)
        }
        None => NoRecordBeforeSnafu { at }.fail(),
    }
}

/// A candidate window intersects an existing record's window.
#[derive(Debug, Snafu)]
#[snafu(display(
    "Validity window {candidate} overlaps existing record {conflicting} with window {existing}"
))]
pub struct OverlapConflict {
    /// The rejected candidate window.
    pub candidate: ValidityWindow,
    /// Id of the existing record it collides with.
    pub conflicting: RecordId,
    /// Window of the existing record.
    pub existing: ValidityWindow,
}

/// Reject `candidate` if it intersects any window in `existing`.
///
/// `exclude` skips one record id: the candidate itself when a stored record
/// is re-validated. The scan reports the first conflict in stored order.
/// Overlap is symmetric, so checking a candidate against the set is the same
/// test in either direction.
pub fn ensure_no_overlap<T: TimeRanged>(
    existing: &[Registered<T>],
    candidate: ValidityWindow,
    exclude: Option<RecordId>,
) -> Result<(), OverlapConflict> {
    for record in existing {
        if exclude == Some(record.id) {
            continue;
        }
        let window = record.record.window();
        if candidate.intersects(&window) {
            return OverlapConflictSnafu {
                candidate,
                conflicting: record.id,
                existing: window,
            }
            .fail();
        }
    }
    Ok(())
}

/// Find the open-ended record for an owner, if any.
///
/// Used as a pre-check before inserting another open-ended window: two
/// simultaneous open windows would make every future covering-phase lookup
/// ambiguous, so they are rejected up front with a dedicated error.
pub fn find_open<T: TimeRanged>(records: &[Registered<T>]) -> Option<&Registered<T>> {
    records.iter().find(|r| r.record.window().is_open())
}

/// A pair of stored records with intersecting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(display("Records {first} and {second} have intersecting validity windows"))]
pub struct StoredOverlap {
    /// Lower id of the pair.
    pub first: RecordId,
    /// Higher id of the pair.
    pub second: RecordId,
}

/// Scan a stored set for intersecting windows, reporting every conflicting
/// pair.
///
/// The write path prevents new overlaps, so a non-empty result points at
/// imported or hand-edited ledger data. The scan is full pairwise rather
/// than adjacent-after-sort: an open-ended window can intersect every later
/// record, not just its neighbor.
pub fn find_stored_overlaps<T: TimeRanged>(records: &[Registered<T>]) -> Vec<StoredOverlap> {
    let mut conflicts = Vec::new();
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            if a.record.window().intersects(&b.record.window()) {
                let (first, second) = if a.id <= b.id {
                    (a.id, b.id)
                } else {
                    (b.id, a.id)
                };
                conflicts.push(StoredOverlap { first, second });
            }
        }
    }
    conflicts
}
