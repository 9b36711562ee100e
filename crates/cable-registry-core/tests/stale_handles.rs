//! Integration test for stale registry handles and cross-handle visibility.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use cable_registry_core::{
    CableId, CableStateVersion, KCalibration, Registry, RegistryLocation, ValidityWindow,
};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0)
        .single()
        .expect("valid test timestamp")
}

fn make_state(cable: u64, from: u32, to: Option<u32>) -> CableStateVersion {
    CableStateVersion {
        cable_id: CableId(cable),
        window: ValidityWindow::new(day(from), to.map(day)).expect("valid test window"),
        length_effective_m: 100.0,
        length_total_m: None,
        strands_total: 10,
        strands_active: 8,
        strands_inactive: 2,
        strand_diameter_mm: 15.2,
        strand_area_mm2: 140.0,
        e_modulus_mpa: 200_000.0,
        mu_total_kg_m: 120.0,
        mu_active_kg_m: 100.0,
        design_tension_tf: 500.0,
        fu_override_mpa: None,
        strand_fu_default_mpa: 250.0,
        guard_enabled: false,
        guard_length_m: None,
        notes: None,
    }
}

fn make_calibration(cable: u64, from: u32, to: Option<u32>, k: f64) -> KCalibration {
    KCalibration {
        cable_id: CableId(cable),
        window: ValidityWindow::new(day(from), to.map(day)).expect("valid test window"),
        k_value: k,
        algorithm_version: "1.0.0".to_string(),
        weighing_measurement_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn stale_handle_sees_new_commits_after_refresh() -> TestResult {
    let tmp = TempDir::new()?;
    let location = RegistryLocation::local(tmp.path());

    let mut writer = Registry::create(location.clone()).await?;

    // Open a "stale" handle (version == 1, Init only).
    let mut stale = Registry::open(location).await?;

    writer.register_cable_state(make_state(1, 1, None)).await?;

    // Stale in-memory snapshot is still old.
    assert_eq!(stale.state().version, 1);
    assert!(stale.state().cable_states_for(CableId(1)).is_empty());

    // But the on-disk version has moved on.
    assert_eq!(stale.current_version().await?, 2);

    stale.refresh().await?;
    assert_eq!(stale.state().version, 2);
    assert_eq!(stale.state().cable_states_for(CableId(1)).len(), 1);
    Ok(())
}

#[tokio::test]
async fn full_workflow_survives_reopen() -> TestResult {
    let tmp = TempDir::new()?;
    let location = RegistryLocation::local(tmp.path());

    {
        let mut registry = Registry::create(location.clone()).await?;
        registry
            .register_cable_state(make_state(1, 1, Some(10)))
            .await?;
        registry.register_cable_state(make_state(1, 12, None)).await?;
        registry
            .register_calibration(make_calibration(1, 1, Some(10), 1.5))
            .await?;
        registry
            .register_calibration(make_calibration(1, 11, None, 2.0))
            .await?;
    }

    let registry = Registry::open(location).await?;

    // Selection resolves against the replayed log exactly as it did against
    // the live handle.
    let early = registry.state_at(CableId(1), day(5))?;
    assert_eq!(early.record.window.valid_from(), day(1));

    let late = registry.state_at(CableId(1), day(20))?;
    assert_eq!(late.record.window.valid_from(), day(12));

    let reading = registry.tension_at(CableId(1), day(20), 2.0)?;
    assert_eq!(reading.k_value, 2.0);
    assert_eq!(reading.tension_tf, 8.0);
    Ok(())
}
