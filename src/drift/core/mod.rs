//! core — shared clock-drift data containers and geometry.
//!
//! Purpose
//! -------
//! Collect the core building blocks of the drift-estimation stack:
//! processing-parameter bundles, append-only per-iteration value
//! histories, station and correlation records, and the great-circle
//! geometry used to derive cable-path distances. Higher layers
//! (measurement, inversion, the repository) build on these primitives.
//!
//! Key behaviors
//! -------------
//! - Define the processing regime ([`ProcessingParameters`]) that
//!   partitions correlations and carries the frequency band, reference
//!   velocity, and quality thresholds.
//! - Track every iteratively refined quantity in an [`IterationSeries`]
//!   so earlier iterations stay inspectable and "never computed" stays
//!   distinct from "computed as NaN".
//! - Model the two record types of the domain: [`Station`] (inventory
//!   metadata plus drift coefficients) and [`Correlation`] (one
//!   stacked cross-correlation under one regime, with its shift
//!   histories).
//!
//! Invariants & assumptions
//! ------------------------
//! - Processing parameters are validated on construction
//!   (`freqmin < freqmax`, both positive); successfully built bundles
//!   can be trusted downstream.
//! - Iteration histories only grow; a recorded value is corrected by
//!   overwriting it in place (typically with NaN), never by removal.
//! - Coordinates are geographic degrees; distances are meters on a
//!   spherical Earth.
//!
//! Conventions
//! -----------
//! - Time on the drift axis is `t_N_lps`, fractional days since the
//!   run's reference time, signed.
//! - Shifts and drift-model values are seconds of instrumental clock
//!   error, positive when the instrument's clock runs ahead.

pub mod correlation;
pub mod geo;
pub mod history;
pub mod params;
pub mod station;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::correlation::{Correlation, ShiftDiagnostics};
pub use self::geo::great_circle_distance_m;
pub use self::history::IterationSeries;
pub use self::params::ProcessingParameters;
pub use self::station::Station;
