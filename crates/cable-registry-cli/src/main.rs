//! CLI tool for managing stay-cable record registries.

mod error;
mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use snafu::{OptionExt, ResultExt};

use cable_registry_core::{
    analysis::ALERT_THRESHOLD_PCT, CableId, CableStateVersion, CableTension, KCalibration,
    Registry, RegistryLocation, SensorId, SensorInstallation, ValidityWindow,
};
use chrono::{DateTime, Utc};

use crate::error::{
    CliError, CliResult, CreateRegistrySnafu, InvalidReadingSnafu, InvalidTimestampSnafu,
    NonPositiveFrequencySnafu, OpenRegistrySnafu, QuerySnafu, RegisterSnafu, RenderSnafu,
};
use crate::render::render_semaphore;

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize an empty registry
    Init {
        #[arg(long)]
        registry: PathBuf,
    },

    /// Register a new cable state version
    AddState {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        cable: u64,

        /// Validity start (RFC 3339)
        #[arg(long)]
        from: String,

        /// Validity end (RFC 3339); omit for an open-ended version
        #[arg(long)]
        to: Option<String>,

        #[arg(long = "length-effective")]
        length_effective_m: f64,

        #[arg(long = "length-total")]
        length_total_m: Option<f64>,

        #[arg(long = "strands-total")]
        strands_total: u32,

        #[arg(long = "strands-active")]
        strands_active: u32,

        #[arg(long = "strands-inactive", default_value_t = 0)]
        strands_inactive: u32,

        #[arg(long = "diameter")]
        strand_diameter_mm: f64,

        #[arg(long = "area")]
        strand_area_mm2: f64,

        #[arg(long = "e-modulus")]
        e_modulus_mpa: f64,

        #[arg(long = "mu-total")]
        mu_total_kg_m: f64,

        #[arg(long = "mu-active")]
        mu_active_kg_m: f64,

        #[arg(long = "design-tension")]
        design_tension_tf: f64,

        #[arg(long = "fu-override")]
        fu_override_mpa: Option<f64>,

        #[arg(long = "fu-default")]
        strand_fu_default_mpa: f64,

        /// Tamper-guard sleeve fitted at the lower anchorage
        #[arg(long = "guard", default_value_t = false)]
        guard_enabled: bool,

        #[arg(long = "guard-length")]
        guard_length_m: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Register a new stiffness calibration for a cable
    AddCalibration {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        cable: u64,

        /// Validity start (RFC 3339)
        #[arg(long)]
        from: String,

        /// Validity end (RFC 3339); omit for an open-ended calibration
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        k: f64,

        #[arg(long, default_value = "1.0.0")]
        algorithm: String,

        /// Weighing measurement the constant was derived from
        #[arg(long)]
        measurement: Option<u64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Register a new sensor installation on a cable
    AddInstallation {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        sensor: u64,

        #[arg(long)]
        cable: u64,

        /// Installation start (RFC 3339)
        #[arg(long)]
        from: String,

        /// Installation end (RFC 3339); omit while the sensor stays mounted
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        height: f64,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the cable state version effective at a timestamp
    StateAt {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        cable: u64,

        #[arg(long)]
        at: String,
    },

    /// Show the stiffness calibration effective at a timestamp
    KAt {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        cable: u64,

        #[arg(long)]
        at: String,
    },

    /// Derive a cable's tension from a measured fundamental frequency
    Tension {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        cable: u64,

        #[arg(long)]
        at: String,

        /// Fundamental frequency in Hz
        #[arg(long)]
        f0: f64,
    },

    /// Scan the registry for stored records with intersecting windows
    Audit {
        #[arg(long)]
        registry: PathBuf,
    },

    /// Classify derived tensions against the alert threshold
    Semaphore {
        #[arg(long)]
        registry: PathBuf,

        #[arg(long)]
        at: String,

        /// Repeatable: CABLE_ID:TENSION_TF or CABLE_ID:TENSION_TF:LABEL
        #[arg(long = "reading")]
        readings: Vec<String>,

        /// Alert threshold as % of Fu
        #[arg(long, default_value_t = ALERT_THRESHOLD_PCT)]
        threshold: f64,

        /// Show only the N worst cables
        #[arg(long)]
        top: Option<usize>,
    },
}

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

fn parse_timestamp(value: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .context(InvalidTimestampSnafu {
            value: value.to_string(),
        })
}

fn parse_window(from: &str, to: Option<&str>) -> CliResult<ValidityWindow> {
    let from = parse_timestamp(from)?;
    let to = match to {
        Some(raw) => Some(parse_timestamp(raw)?),
        None => None,
    };
    Ok(ValidityWindow::new(from, to)?)
}

fn parse_reading(spec: &str) -> CliResult<CableTension> {
    let mut parts = spec.splitn(3, ':');
    let cable = parts
        .next()
        .and_then(|p| p.parse::<u64>().ok())
        .context(InvalidReadingSnafu { spec })?;
    let tension_tf = parts
        .next()
        .and_then(|p| p.parse::<f64>().ok())
        .context(InvalidReadingSnafu { spec })?;
    let label = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("C{cable}"));

    Ok(CableTension {
        cable_id: CableId(cable),
        label,
        tension_tf,
    })
}

async fn create_registry(root: &Path) -> CliResult<Registry> {
    Registry::create(RegistryLocation::local(root))
        .await
        .context(CreateRegistrySnafu {
            registry: root.display().to_string(),
        })
}

async fn open_registry(root: &Path) -> CliResult<Registry> {
    Registry::open(RegistryLocation::local(root))
        .await
        .context(OpenRegistrySnafu {
            registry: root.display().to_string(),
        })
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).context(RenderSnafu)?;
    println!("{json}");
    Ok(())
}

async fn cmd_init(registry: &Path) -> CliResult<()> {
    create_registry(registry).await?;
    println!("Created registry at {}", registry.display());
    Ok(())
}

async fn cmd_add_state(registry: &Path, state: CableStateVersion) -> CliResult<()> {
    let mut reg = open_registry(registry).await?;
    let cable = state.cable_id;
    let id = reg.register_cable_state(state).await.context(RegisterSnafu)?;
    println!("Registered state version {id} for {cable}");
    Ok(())
}

async fn cmd_add_calibration(registry: &Path, calibration: KCalibration) -> CliResult<()> {
    let mut reg = open_registry(registry).await?;
    let cable = calibration.cable_id;
    let id = reg
        .register_calibration(calibration)
        .await
        .context(RegisterSnafu)?;
    println!("Registered calibration {id} for {cable}");
    Ok(())
}

async fn cmd_add_installation(registry: &Path, installation: SensorInstallation) -> CliResult<()> {
    let mut reg = open_registry(registry).await?;
    let sensor = installation.sensor_id;
    let id = reg
        .register_installation(installation)
        .await
        .context(RegisterSnafu)?;
    println!("Registered installation {id} for {sensor}");
    Ok(())
}

async fn cmd_state_at(registry: &Path, cable: u64, at: &str) -> CliResult<()> {
    let reg = open_registry(registry).await?;
    let at = parse_timestamp(at)?;
    let selected = reg.state_at(CableId(cable), at).context(QuerySnafu)?;
    print_json(selected)
}

async fn cmd_k_at(registry: &Path, cable: u64, at: &str) -> CliResult<()> {
    let reg = open_registry(registry).await?;
    let at = parse_timestamp(at)?;
    let selected = reg.calibration_at(CableId(cable), at).context(QuerySnafu)?;
    print_json(selected)
}

async fn cmd_tension(registry: &Path, cable: u64, at: &str, f0: f64) -> CliResult<()> {
    snafu::ensure!(f0 > 0.0, NonPositiveFrequencySnafu { value: f0 });

    let reg = open_registry(registry).await?;
    let at = parse_timestamp(at)?;
    let reading = reg.tension_at(CableId(cable), at, f0).context(QuerySnafu)?;
    print_json(&reading)
}

async fn cmd_audit(registry: &Path) -> CliResult<()> {
    let reg = open_registry(registry).await?;

    let conflicts = reg.audit();
    if conflicts.is_empty() {
        println!("No overlapping windows found");
    } else {
        for conflict in &conflicts {
            println!("{conflict}");
        }
        println!("{} conflicting pair(s) found", conflicts.len());
    }
    Ok(())
}

async fn cmd_semaphore(
    registry: &Path,
    at: &str,
    readings: &[String],
    threshold: f64,
    top: Option<usize>,
) -> CliResult<()> {
    let reg = open_registry(registry).await?;
    let at = parse_timestamp(at)?;

    let readings: Vec<CableTension> = readings
        .iter()
        .map(|spec| parse_reading(spec))
        .collect::<CliResult<_>>()?;

    let report = reg
        .semaphore(&readings, at, threshold, top)
        .context(QuerySnafu)?;
    println!("{}", render_semaphore(&report));
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Init { registry } => cmd_init(&registry).await,

        Command::AddState {
            registry,
            cable,
            from,
            to,
            length_effective_m,
            length_total_m,
            strands_total,
            strands_active,
            strands_inactive,
            strand_diameter_mm,
            strand_area_mm2,
            e_modulus_mpa,
            mu_total_kg_m,
            mu_active_kg_m,
            design_tension_tf,
            fu_override_mpa,
            strand_fu_default_mpa,
            guard_enabled,
            guard_length_m,
            notes,
        } => {
            let window = parse_window(&from, to.as_deref())?;
            let state = CableStateVersion {
                cable_id: CableId(cable),
                window,
                length_effective_m,
                length_total_m,
                strands_total,
                strands_active,
                strands_inactive,
                strand_diameter_mm,
                strand_area_mm2,
                e_modulus_mpa,
                mu_total_kg_m,
                mu_active_kg_m,
                design_tension_tf,
                fu_override_mpa,
                strand_fu_default_mpa,
                guard_enabled,
                guard_length_m,
                notes,
            };
            cmd_add_state(&registry, state).await
        }

        Command::AddCalibration {
            registry,
            cable,
            from,
            to,
            k,
            algorithm,
            measurement,
            notes,
        } => {
            let window = parse_window(&from, to.as_deref())?;
            let calibration = KCalibration {
                cable_id: CableId(cable),
                window,
                k_value: k,
                algorithm_version: algorithm,
                weighing_measurement_id: measurement,
                notes,
            };
            cmd_add_calibration(&registry, calibration).await
        }

        Command::AddInstallation {
            registry,
            sensor,
            cable,
            from,
            to,
            height,
            notes,
        } => {
            let window = parse_window(&from, to.as_deref())?;
            let installation = SensorInstallation {
                sensor_id: SensorId(sensor),
                cable_id: CableId(cable),
                window,
                height_m: height,
                notes,
            };
            cmd_add_installation(&registry, installation).await
        }

        Command::StateAt { registry, cable, at } => cmd_state_at(&registry, cable, &at).await,

        Command::KAt { registry, cable, at } => cmd_k_at(&registry, cable, &at).await,

        Command::Tension {
            registry,
            cable,
            at,
            f0,
        } => cmd_tension(&registry, cable, &at, f0).await,

        Command::Audit { registry } => cmd_audit(&registry).await,

        Command::Semaphore {
            registry,
            at,
            readings,
            threshold,
            top,
        } => cmd_semaphore(&registry, &at, &readings, threshold, top).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
