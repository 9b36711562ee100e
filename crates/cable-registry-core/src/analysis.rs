//! Tension derivation and threshold ("semaphore") evaluation.
//!
//! Pure computations over already-selected records:
//!
//! - [`tension_from_frequency`] turns a measured fundamental frequency and a
//!   stiffness calibration constant into a tension value.
//! - [`evaluate_semaphore`] classifies per-cable tensions against the alert
//!   threshold and assembles a worst-first report.
//!
//! Input positivity (`f0 > 0`, `k > 0`) is enforced at the data-entry
//! boundary, not re-checked here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CableId;
use crate::validity::RecordId;

/// Alert threshold as a percentage of ultimate strength.
///
/// A cable working above this fraction of its ultimate strength is flagged.
pub const ALERT_THRESHOLD_PCT: f64 = 45.0;

/// Derive cable tension from a fundamental frequency and a calibration
/// constant: `tension = f0^2 * k`.
pub fn tension_from_frequency(f0_hz: f64, k_value: f64) -> f64 {
    f0_hz * f0_hz * k_value
}

/// A derived tension, annotated with the calibration that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionReading {
    /// Cable the reading belongs to.
    pub cable_id: CableId,
    /// Measured fundamental frequency in Hz.
    pub f0_hz: f64,
    /// Calibration constant used.
    pub k_value: f64,
    /// Record id of the calibration used, for traceability.
    pub calibration_id: RecordId,
    /// Derived tension in tonnes-force.
    pub tension_tf: f64,
}

/// Semaphore classification of one cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemaphoreStatus {
    /// Working tension below the alert threshold.
    Ok,
    /// Working tension above the alert threshold.
    Alert,
}

impl fmt::Display for SemaphoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaphoreStatus::Ok => write!(f, "OK"),
            SemaphoreStatus::Alert => write!(f, "ALERT"),
        }
    }
}

/// Per-cable input to the semaphore: a derived tension and the ultimate
/// strength effective at the evaluation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreInput {
    /// Cable being classified.
    pub cable_id: CableId,
    /// Display label, typically the cable's name on the bridge.
    pub label: String,
    /// Derived tension in tonnes-force.
    pub tension_tf: f64,
    /// Effective ultimate strength (override-or-default).
    pub fu: f64,
}

/// One classified row of the semaphore report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreEntry {
    /// Cable being classified.
    pub cable_id: CableId,
    /// Display label carried over from the input.
    pub label: String,
    /// Derived tension in tonnes-force.
    pub tension_tf: f64,
    /// Effective ultimate strength used for the ratio.
    pub fu: f64,
    /// Working tension as a percentage of ultimate strength.
    pub pct_fu: f64,
    /// Classification against the threshold.
    pub status: SemaphoreStatus,
}

/// Threshold report over a set of cables, sorted worst-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreReport {
    /// Threshold the entries were classified against.
    pub threshold_pct: f64,
    /// Cables evaluated, before any top-N truncation.
    pub total: usize,
    /// Cables above the threshold, before any top-N truncation.
    pub exceeded: usize,
    /// Classified entries, descending by `pct_fu`, truncated to top-N when
    /// requested.
    pub entries: Vec<SemaphoreEntry>,
}

/// Classify cables against `threshold_pct` and assemble the report.
///
/// - `pct_fu` is `tension / fu * 100`, or 0 when `fu` is 0 (no meaningful
///   ratio without an ultimate strength).
/// - Entries are sorted by `pct_fu` descending so the worst cables lead.
/// - `top_n` truncates the entry list only; `total` and `exceeded` always
///   count the full input.
pub fn evaluate_semaphore(
    inputs: Vec<SemaphoreInput>,
    threshold_pct: f64,
    top_n: Option<usize>,
) -> SemaphoreReport {
    let total = inputs.len();

    let mut entries: Vec<SemaphoreEntry> = inputs
        .into_iter()
        .map(|input| {
            let pct_fu = if input.fu != 0.0 {
                input.tension_tf / input.fu * 100.0
            } else {
                0.0
            };
            let status = if pct_fu > threshold_pct {
                SemaphoreStatus::Alert
            } else {
                SemaphoreStatus::Ok
            };
            SemaphoreEntry {
                cable_id: input.cable_id,
                label: input.label,
                tension_tf: input.tension_tf,
                fu: input.fu,
                pct_fu,
                status,
            }
        })
        .collect();

    let exceeded = entries
        .iter()
        .filter(|e| e.status == SemaphoreStatus::Alert)
        .count();

    entries.sort_by(|a, b| {
        b.pct_fu
            .partial_cmp(&a.pct_fu)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(n) = top_n {
        entries.truncate(n);
    }

    SemaphoreReport {
        threshold_pct,
        total,
        exceeded,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: u64, tension: f64, fu: f64) -> SemaphoreInput {
        SemaphoreInput {
            cable_id: CableId(id),
            label: format!("C{id}"),
            tension_tf: tension,
            fu,
        }
    }

    #[test]
    fn tension_matches_f0_squared_times_k() {
        assert_eq!(tension_from_frequency(2.0, 1.5), 6.0);
        assert_eq!(tension_from_frequency(1.0, 0.5), 0.5);
        assert_eq!(tension_from_frequency(3.0, 2.0), 18.0);
    }

    #[test]
    fn tension_is_monotonic_in_both_arguments() {
        let base = tension_from_frequency(2.0, 1.5);
        assert!(tension_from_frequency(2.5, 1.5) > base);
        assert!(tension_from_frequency(2.0, 1.6) > base);
    }

    #[test]
    fn semaphore_classifies_against_threshold() {
        // 50% and 40% of fu against the default threshold.
        let report = evaluate_semaphore(
            vec![input(1, 50.0, 100.0), input(2, 40.0, 100.0)],
            ALERT_THRESHOLD_PCT,
            None,
        );

        assert_eq!(report.total, 2);
        assert_eq!(report.exceeded, 1);
        assert_eq!(report.entries[0].cable_id, CableId(1));
        assert_eq!(report.entries[0].status, SemaphoreStatus::Alert);
        assert_eq!(report.entries[1].status, SemaphoreStatus::Ok);
    }

    #[test]
    fn semaphore_threshold_is_exclusive() {
        // Exactly at the threshold is still OK; only above it alerts.
        let report = evaluate_semaphore(vec![input(1, 45.0, 100.0)], ALERT_THRESHOLD_PCT, None);
        assert_eq!(report.entries[0].status, SemaphoreStatus::Ok);
        assert_eq!(report.exceeded, 0);
    }

    #[test]
    fn semaphore_sorts_worst_first_and_truncates() {
        let report = evaluate_semaphore(
            vec![
                input(1, 10.0, 100.0),
                input(2, 60.0, 100.0),
                input(3, 30.0, 100.0),
            ],
            ALERT_THRESHOLD_PCT,
            Some(2),
        );

        // Counts cover the full input even when truncated.
        assert_eq!(report.total, 3);
        assert_eq!(report.exceeded, 1);

        let order: Vec<CableId> = report.entries.iter().map(|e| e.cable_id).collect();
        assert_eq!(order, vec![CableId(2), CableId(3)]);
    }

    #[test]
    fn semaphore_handles_zero_fu() {
        let report = evaluate_semaphore(vec![input(1, 50.0, 0.0)], ALERT_THRESHOLD_PCT, None);
        assert_eq!(report.entries[0].pct_fu, 0.0);
        assert_eq!(report.entries[0].status, SemaphoreStatus::Ok);
    }

    #[test]
    fn semaphore_empty_input() {
        let report = evaluate_semaphore(vec![], ALERT_THRESHOLD_PCT, None);
        assert_eq!(report.total, 0);
        assert_eq!(report.exceeded, 0);
        assert!(report.entries.is_empty());
    }
}
