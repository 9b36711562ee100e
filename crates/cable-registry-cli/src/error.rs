use cable_registry_core::RegistryError;

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid timestamp '{value}': expected RFC 3339, e.g. 2024-06-01T00:00:00Z"))]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[snafu(display(
        "Invalid --reading '{spec}': expected CABLE_ID:TENSION_TF or CABLE_ID:TENSION_TF:LABEL"
    ))]
    InvalidReading { spec: String },

    #[snafu(transparent)]
    InvalidWindow {
        source: cable_registry_core::validity::InvalidWindow,
    },

    #[snafu(display("--f0 must be > 0 (got {value})"))]
    NonPositiveFrequency { value: f64 },

    #[snafu(display(
        "Failed to create registry at {registry}. \
         Ensure the directory is writable and not already a registry."
    ))]
    CreateRegistry {
        registry: String,
        #[snafu(source(from(RegistryError, Box::new)))]
        source: Box<RegistryError>,
    },

    #[snafu(display(
        "Failed to open registry at {registry}. \
         Ensure it was initialized with 'cablereg init'."
    ))]
    OpenRegistry {
        registry: String,
        #[snafu(source(from(RegistryError, Box::new)))]
        source: Box<RegistryError>,
    },

    #[snafu(display("Registration rejected: {source}"))]
    Register {
        #[snafu(source(from(RegistryError, Box::new)))]
        source: Box<RegistryError>,
    },

    #[snafu(display("Query failed: {source}"))]
    Query {
        #[snafu(source(from(RegistryError, Box::new)))]
        source: Box<RegistryError>,
    },

    #[snafu(display("Failed to render output: {source}"))]
    Render { source: serde_json::Error },
}
