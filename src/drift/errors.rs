//! Unified error handling for the clock-drift stack.
//!
//! This module defines `DriftError`, the central error type used by the
//! repository build, apriori estimation, shift measurement, and the
//! inversion pipeline. Variants are grouped by taxonomy: missing input
//! resources (fatal to the run), lookup failures (fatal to the calling
//! operation), invalid arguments (malformed or self-referential queries),
//! and precondition violations (an operation invoked before its required
//! prior stage). An alias `DriftResult<T>` standardizes the return type
//! across the crate.
//!
//! ## Conventions
//! - Numerically unresolved shifts are **not** errors; they propagate as
//!   NaN sentinel values inside [`IterationSeries`] entries and are
//!   excluded from the design matrix downstream.
//! - Per-observation parse failures during the repository build are
//!   recovered locally (observation skipped, run continues); only
//!   structural failures surface through this type.
//!
//! [`IterationSeries`]: crate::drift::core::history::IterationSeries

/// Unified error type for clock-drift operations.
///
/// Covers unreachable input sources, unknown station/correlation lookups,
/// self-referential or malformed queries, and operations invoked out of
/// stage order. Designed to integrate with `anyhow::Error` via `From`,
/// and to provide readable diagnostics through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftError {
    // ---- Missing resources ----
    /// A required input file or directory is absent or unreadable.
    MissingResource {
        path: String,
    },

    // ---- Lookup failures ----
    /// No station with this code exists in the repository.
    StationNotFound {
        code: String,
    },

    /// No correlation with this file path exists in the repository.
    CorrelationNotFound {
        path: String,
    },

    // ---- Invalid arguments ----
    /// A station-pair query used the same code on both sides.
    SameStationPair {
        code: String,
    },

    /// Band-pass edges must satisfy freqmin < freqmax.
    InvalidFrequencyBand {
        freqmin: f64,
        freqmax: f64,
    },

    // ---- Precondition violations ----
    /// Apriori estimation received correlations with differing
    /// processing parameters.
    MixedProcessingParameters,

    /// Apriori estimation received correlations whose station1/station2
    /// ordering is inconsistent across the set.
    InconsistentStationPair,

    /// Apriori estimation needs at least two correlations per pair.
    TooFewCorrelations {
        found: usize,
    },

    /// The drift model cannot be propagated before the apriori shift
    /// has been seeded for this correlation.
    AprioriNotSeeded {
        station1: String,
        station2: String,
    },

    /// Shift measurement was requested before any instrumental-shift
    /// estimate exists for this correlation.
    InstrumentalShiftMissing {
        station1: String,
        station2: String,
    },

    /// The design system contains no usable observations.
    NoUsableObservations,

    // ---- Anyhow catchall ----
    Anyhow(String),

    // ---- Fallback ----
    UnknownError,
}

/// Crate-wide result alias for operations that may produce [`DriftError`].
pub type DriftResult<T> = Result<T, DriftError>;

impl From<anyhow::Error> for DriftError {
    fn from(err: anyhow::Error) -> Self {
        DriftError::Anyhow(err.to_string())
    }
}

impl std::error::Error for DriftError {}

impl std::fmt::Display for DriftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Missing resources ----
            DriftError::MissingResource { path } => {
                write!(f, "Drift Error: Required resource is missing or unreadable: {}", path)
            }

            // ---- Lookup failures ----
            DriftError::StationNotFound { code } => {
                write!(f, "Drift Error: Station {} not found in the repository", code)
            }
            DriftError::CorrelationNotFound { path } => {
                write!(f, "Drift Error: Correlation for file {} not found in the repository", path)
            }

            // ---- Invalid arguments ----
            DriftError::SameStationPair { code } => {
                write!(f, "Drift Error: Station pair query needs two different stations, got {} twice", code)
            }
            DriftError::InvalidFrequencyBand { freqmin, freqmax } => {
                write!(
                    f,
                    "Drift Error: Band edges must satisfy freqmin < freqmax, got {} >= {}",
                    freqmin, freqmax
                )
            }

            // ---- Precondition violations ----
            DriftError::MixedProcessingParameters => {
                write!(f, "Drift Error: The processing parameters differ across the correlation set")
            }
            DriftError::InconsistentStationPair => {
                write!(
                    f,
                    "Drift Error: The station1/station2 ordering is not the same for all correlations"
                )
            }
            DriftError::TooFewCorrelations { found } => {
                write!(
                    f,
                    "Drift Error: At least two correlations are needed for apriori estimation, found {}",
                    found
                )
            }
            DriftError::AprioriNotSeeded { station1, station2 } => {
                write!(
                    f,
                    "Drift Error: No apriori estimate seeded for correlation {}-{}",
                    station1, station2
                )
            }
            DriftError::InstrumentalShiftMissing { station1, station2 } => {
                write!(
                    f,
                    "Drift Error: No instrumental-shift estimate found for stations {} and {}",
                    station1, station2
                )
            }
            DriftError::NoUsableObservations => {
                write!(f, "Drift Error: The design system contains no usable observations")
            }

            // ---- Anyhow catchall ----
            DriftError::Anyhow(msg) => write!(f, "Drift Error: {}", msg),

            // ---- Fallback ----
            DriftError::UnknownError => write!(f, "Drift Error: Unknown error occurred"),
        }
    }
}
