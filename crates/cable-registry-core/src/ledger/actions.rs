//! Commit payloads written to the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CableStateVersion, KCalibration, SensorInstallation};

/// Current registry log format version.
///
/// Bumped only on a breaking change to the on-disk JSON format.
pub const REGISTRY_FORMAT_VERSION: u32 = 1;

/// Registry-level metadata recorded by the `Init` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMeta {
    /// Creation timestamp of the registry, stored as RFC 3339 UTC.
    pub created_at: DateTime<Utc>,
    /// Format version for future evolution of the log format.
    pub format_version: u32,
}

impl RegistryMeta {
    /// Metadata for a registry created now.
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            format_version: REGISTRY_FORMAT_VERSION,
        }
    }
}

impl Default for RegistryMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// One action inside a commit.
///
/// Record-adding actions assign the next record id implicitly: ids are the
/// running count of records added across the whole log, in replay order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogAction {
    /// Bootstrap the registry metadata. Must appear in the first commit.
    Init(RegistryMeta),
    /// Register a cable state version.
    AddCableState(CableStateVersion),
    /// Register a stiffness calibration.
    AddCalibration(KCalibration),
    /// Register a sensor installation.
    AddInstallation(SensorInstallation),
}

/// A single committed version of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Version this commit creates.
    pub version: u64,
    /// Version the writer observed before committing.
    pub base_version: u64,
    /// Wall-clock commit time.
    pub timestamp: DateTime<Utc>,
    /// Actions applied by this commit.
    pub actions: Vec<LogAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CableId;
    use crate::validity::ValidityWindow;
    use chrono::TimeZone;

    #[test]
    fn commit_json_roundtrip() {
        let ts = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");

        let cal = KCalibration {
            cable_id: CableId(1),
            window: ValidityWindow::open(ts),
            k_value: 0.55,
            algorithm_version: "1.0.0".to_string(),
            weighing_measurement_id: None,
            notes: Some("derived from campaign 3".to_string()),
        };

        let commit = Commit {
            version: 2,
            base_version: 1,
            timestamp: ts,
            actions: vec![LogAction::AddCalibration(cal)],
        };

        let json = serde_json::to_string_pretty(&commit).expect("serialize commit");
        let decoded: Commit = serde_json::from_str(&json).expect("deserialize commit");

        assert_eq!(commit, decoded);
    }

    #[test]
    fn init_action_roundtrip() {
        let meta = RegistryMeta {
            created_at: Utc
                .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            format_version: REGISTRY_FORMAT_VERSION,
        };
        let action = LogAction::Init(meta);

        let json = serde_json::to_string(&action).expect("serialize");
        let decoded: LogAction = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(action, decoded);
    }
}
