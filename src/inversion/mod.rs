//! inversion — inclusion filtering, design assembly, and the
//! least-squares solve.
//!
//! Purpose
//! -------
//! Turn the measured apparent shifts into per-station drift
//! coefficients. [`inclusion`] decides which stations carry enough
//! usable observations, [`design`] assembles their correlations into a
//! linear system, and [`solver`] solves it in minimum-norm form,
//! appends the coefficients, and rejects outlying observations against
//! the solved model.
//!
//! Key behaviors
//! -------------
//! - One call to [`solve_drift_system`] is one iteration: every
//!   drifting station's coefficient histories grow by exactly one
//!   entry, solved or zero-backfilled.
//! - The typical loop per iteration is: propagate the drift model,
//!   sweep apparent shifts, filter inclusion, solve, reject outliers,
//!   and repeat until the coefficients settle.
//!
//! Conventions
//! -----------
//! - Column layout is station-index order with the rate column before
//!   the offset column; all-zero columns are dropped before solving.

pub mod design;
pub mod inclusion;
pub mod solver;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::design::{build_design_system, DesignColumn, DesignSystem, DriftTerm, RowRecord};
pub use self::inclusion::{
    apply_inclusion_filter, count_correlation_periods, InclusionCriteria,
};
pub use self::solver::{reject_outliers, solve_drift_system, DEFAULT_RCOND};
