//! Integration tests for the CLI binary.

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cablereg"))
}

fn init_registry(root: &str) {
    cli()
        .args(["init", "--registry", root])
        .assert()
        .success()
        .stdout(contains("Created registry at"));
}

fn add_state(root: &str, cable: &str, from: &str, to: Option<&str>) -> Command {
    let mut cmd = cli();
    cmd.args([
        "add-state",
        "--registry",
        root,
        "--cable",
        cable,
        "--from",
        from,
        "--length-effective",
        "100.0",
        "--strands-total",
        "10",
        "--strands-active",
        "8",
        "--diameter",
        "15.2",
        "--area",
        "140.0",
        "--e-modulus",
        "200000",
        "--mu-total",
        "120.0",
        "--mu-active",
        "100.0",
        "--design-tension",
        "500.0",
        "--fu-default",
        "250.0",
    ]);
    if let Some(to) = to {
        cmd.args(["--to", to]);
    }
    cmd
}

#[test]
fn cli_init_add_state_and_query() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    add_state(&root, "1", "2024-01-01T00:00:00Z", Some("2024-06-01T00:00:00Z"))
        .assert()
        .success()
        .stdout(contains("Registered state version #1 for cable 1"));

    cli()
        .args([
            "state-at",
            "--registry",
            &root,
            "--cable",
            "1",
            "--at",
            "2024-03-01T00:00:00Z",
        ])
        .assert()
        .success()
        .stdout(contains("\"length_effective_m\": 100.0"));

    Ok(())
}

#[test]
fn cli_rejects_overlapping_state_windows() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    add_state(&root, "1", "2024-01-01T00:00:00Z", Some("2024-06-01T00:00:00Z"))
        .assert()
        .success();

    // Touches the existing window at the boundary instant: closed intervals
    // conflict.
    add_state(&root, "1", "2024-06-01T00:00:00Z", Some("2024-12-01T00:00:00Z"))
        .assert()
        .failure()
        .stderr(contains("overlaps existing record"));

    Ok(())
}

#[test]
fn cli_rejects_second_open_version() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    add_state(&root, "1", "2024-01-01T00:00:00Z", None)
        .assert()
        .success();

    add_state(&root, "1", "2025-01-01T00:00:00Z", None)
        .assert()
        .failure()
        .stderr(contains("open-ended state version"));

    Ok(())
}

#[test]
fn cli_tension_uses_registered_calibration() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    cli()
        .args([
            "add-calibration",
            "--registry",
            &root,
            "--cable",
            "1",
            "--from",
            "2024-01-01T00:00:00Z",
            "--k",
            "1.5",
        ])
        .assert()
        .success()
        .stdout(contains("Registered calibration #1 for cable 1"));

    cli()
        .args([
            "tension",
            "--registry",
            &root,
            "--cable",
            "1",
            "--at",
            "2024-03-01T00:00:00Z",
            "--f0",
            "2.0",
        ])
        .assert()
        .success()
        .stdout(contains("\"tension_tf\": 6.0"));

    Ok(())
}

#[test]
fn cli_semaphore_reports_alerts() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    add_state(&root, "1", "2024-01-01T00:00:00Z", None)
        .assert()
        .success();

    // 150/250 = 60% of Fu: above the default 45% threshold.
    cli()
        .args([
            "semaphore",
            "--registry",
            &root,
            "--at",
            "2024-03-01T00:00:00Z",
            "--reading",
            "1:150.0:T-01",
        ])
        .assert()
        .success()
        .stdout(contains("ALERT"))
        .stdout(contains("alerts: 1"));

    Ok(())
}

#[test]
fn cli_installation_and_audit() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("registry");
    let root = root.to_string_lossy();

    init_registry(&root);

    cli()
        .args([
            "add-installation",
            "--registry",
            &root,
            "--sensor",
            "3",
            "--cable",
            "1",
            "--from",
            "2024-01-01T00:00:00Z",
            "--height",
            "5.0",
        ])
        .assert()
        .success()
        .stdout(contains("Registered installation #1 for sensor 3"));

    // Same sensor on another cable while still mounted: rejected.
    cli()
        .args([
            "add-installation",
            "--registry",
            &root,
            "--sensor",
            "3",
            "--cable",
            "2",
            "--from",
            "2024-06-01T00:00:00Z",
            "--height",
            "4.0",
        ])
        .assert()
        .failure()
        .stderr(contains("overlaps existing record"));

    cli()
        .args(["audit", "--registry", &root])
        .assert()
        .success()
        .stdout(contains("No overlapping windows found"));

    Ok(())
}

#[test]
fn cli_fails_cleanly_on_missing_registry() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("nope");
    let root = root.to_string_lossy();

    cli()
        .args([
            "state-at",
            "--registry",
            &root,
            "--cable",
            "1",
            "--at",
            "2024-03-01T00:00:00Z",
        ])
        .assert()
        .failure()
        .stderr(contains("Failed to open registry"));

    Ok(())
}
