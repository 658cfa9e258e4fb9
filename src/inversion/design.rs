//! Design-system assembly: turning usable apparent shifts into the
//! least-squares matrix and observation vector.
//!
//! Purpose
//! -------
//! Each usable correlation contributes one row relating the drift
//! coefficients `(a, b)` of its two stations to the observed apparent
//! shift. This module walks the correlations regime by regime, skips
//! the unusable ones, emits the rows with their per-row diagnostics,
//! and drops the all-zero columns so the solver only sees stations
//! with actual observations.
//!
//! Key behaviors
//! -------------
//! - A correlation is skipped when either station is excluded from the
//!   inversion or its latest apparent shift is NaN.
//! - Row coefficients: `[+2·t_N_lps, +2]` in the first station's
//!   column pair when it drifts, `[-2·t_N_lps, -2]` in the second's.
//!   Synchronized stations contribute nothing.
//! - On the first iteration no model exists yet, so the per-row
//!   predicted shift and residual are NaN.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column order is station-index order, rate before offset, with
//!   all-zero pairs removed; [`DesignSystem::columns`] records the
//!   surviving layout for the solver.
use crate::drift::errors::{DriftError, DriftResult};
use crate::drift::repository::ClockDrift;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use tracing::warn;

/// Which drift coefficient a design column solves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftTerm {
    /// The slope `a`, in seconds per day.
    Rate,
    /// The intercept `b`, in seconds.
    Offset,
}

/// One surviving column of the design matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignColumn {
    pub station_code: String,
    pub term: DriftTerm,
}

/// Per-row diagnostics, mirroring one usable correlation.
///
/// Fields
/// ------
/// - `observed`: the apparent shift that entered the observation
///   vector, in seconds.
/// - `predicted`: the previous model's shift for this correlation, NaN
///   on the first iteration.
/// - `residual`: `observed - predicted`, NaN whenever `predicted` is.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub station1_code: String,
    pub station2_code: String,
    pub average_date: DateTime<Utc>,
    pub observed: f64,
    pub predicted: f64,
    pub residual: f64,
    pub cpl_dist: f64,
    pub number_days: f64,
}

/// The assembled least-squares system.
///
/// Fields
/// ------
/// - `matrix`: rows × surviving columns, zero columns removed.
/// - `observed`: apparent shifts, one per row.
/// - `columns`: surviving column layout, aligned with `matrix`.
/// - `rows`: per-row diagnostics, aligned with `matrix`.
#[derive(Debug, Clone)]
pub struct DesignSystem {
    pub matrix: Array2<f64>,
    pub observed: Array1<f64>,
    pub columns: Vec<DesignColumn>,
    pub rows: Vec<RowRecord>,
}

/// Assemble the design system from the current correlation state.
///
/// Errors
/// ------
/// - `DriftError::NoUsableObservations` when no correlation survives
///   the skip rules.
pub fn build_design_system(cd: &ClockDrift) -> DriftResult<DesignSystem> {
    let width = cd.stations().len() * 2;
    let mut dense_rows: Vec<Vec<f64>> = Vec::new();
    let mut observed = Vec::new();
    let mut rows = Vec::new();

    for params in cd.processing_parameters() {
        for correlation in cd.correlations_with_parameters(params) {
            let station1 = cd.station(&correlation.station1_code)?;
            let station2 = cd.station(&correlation.station2_code)?;
            if !station1.included_in_inversion || !station2.included_in_inversion {
                continue;
            }
            let t_app = match correlation.latest_t_app() {
                Some(value) if value.is_finite() => value,
                _ => continue,
            };

            let predicted = if correlation.t_app.len() == 1 {
                f64::NAN
            } else {
                cd.predicted_shift(correlation, None).unwrap_or(f64::NAN)
            };

            let t = correlation.t_n_lps;
            let mut row = vec![0.0; width];
            if station1.needs_correction {
                row[station1.index * 2] = 2.0 * t;
                row[station1.index * 2 + 1] = 2.0;
            }
            if station2.needs_correction {
                row[station2.index * 2] = -2.0 * t;
                row[station2.index * 2 + 1] = -2.0;
            }

            dense_rows.push(row);
            observed.push(t_app);
            rows.push(RowRecord {
                station1_code: correlation.station1_code.clone(),
                station2_code: correlation.station2_code.clone(),
                average_date: correlation.average_date,
                observed: t_app,
                predicted,
                residual: t_app - predicted,
                cpl_dist: correlation.cpl_dist,
                number_days: correlation.number_days,
            });
        }
    }

    if dense_rows.is_empty() {
        return Err(DriftError::NoUsableObservations);
    }

    // Drop all-zero columns and record the surviving layout.
    let mut columns = Vec::new();
    let mut kept_indices = Vec::new();
    for station in cd.stations() {
        for (offset, term) in [(0, DriftTerm::Rate), (1, DriftTerm::Offset)] {
            let column = station.index * 2 + offset;
            if dense_rows.iter().any(|row| row[column] != 0.0) {
                columns.push(DesignColumn { station_code: station.code.clone(), term });
                kept_indices.push(column);
            }
        }
    }

    for station in cd.stations() {
        if station.needs_correction
            && station.included_in_inversion
            && !columns.iter().any(|c| c.station_code == station.code)
        {
            warn!(station = %station.code, "no usable apparent shifts for station");
        }
    }

    let mut matrix = Array2::zeros((dense_rows.len(), kept_indices.len()));
    for (r, row) in dense_rows.iter().enumerate() {
        for (k, &column) in kept_indices.iter().enumerate() {
            matrix[[r, k]] = row[column];
        }
    }

    Ok(DesignSystem {
        matrix,
        observed: Array1::from_vec(observed),
        columns,
        rows,
    })
}
