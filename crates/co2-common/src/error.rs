//! Error types for the CO2 leakage crates.

use thiserror::Error;

/// Result type alias using Co2Error.
pub type Co2Result<T> = Result<T, Co2Error>;

/// Primary error type for surface publishing and containment aggregation.
///
/// "Not found" is deliberately absent: missing surfaces and empty truncation
/// ensembles are reported as `Ok(None)` by the operations that produce them.
#[derive(Debug, Error)]
pub enum Co2Error {
    // === Validation Errors ===
    #[error(
        "Containment table validation error for provider {provider} in realization {realization} \
         (and possibly other files).\n  Expected columns: {}\n  Found columns: {}\n  \
         (Missing columns: {}) Provided files are possibly from an outdated version of ccs-scripts?",
        .expected.join(", "),
        .found.join(", "),
        .missing.join(", ")
    )]
    ContainmentValidation {
        provider: String,
        realization: String,
        expected: Vec<String>,
        found: Vec<String>,
        missing: Vec<String>,
    },

    #[error("Containment table has no realizations: {0}")]
    EmptyTable(String),

    // === Precondition Errors ===
    #[error("Surface attribute '{0}' does not match any known map attribute")]
    UnknownMapAttribute(String),

    #[error("Grid shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    // === Collaborator Errors ===
    #[error("Failed to read surface: {0}")]
    SurfaceRead(String),

    #[error("Failed to read table: {0}")]
    TableRead(String),

    #[error("Failed to encode surface image: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Co2Error {
    /// True for errors that indicate a caller or configuration mismatch
    /// rather than a collaborator failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Co2Error::UnknownMapAttribute(_)
                | Co2Error::ShapeMismatch { .. }
                | Co2Error::InvalidGrid(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for Co2Error {
    fn from(err: std::io::Error) -> Self {
        Co2Error::SurfaceRead(err.to_string())
    }
}

impl From<serde_json::Error> for Co2Error {
    fn from(err: serde_json::Error) -> Self {
        Co2Error::SurfaceRead(format!("JSON error: {}", err))
    }
}
