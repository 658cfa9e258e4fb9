//! Least-squares solution of the drift system and residual-based
//! outlier rejection.
//!
//! Purpose
//! -------
//! Solve the assembled design system for the per-station drift
//! coefficients `(a, b)`, append them to the station histories, and
//! close the iteration. The companion [`reject_outliers`] overwrites
//! apparent shifts that disagree with the solved model so the next
//! iteration no longer sees them.
//!
//! Key behaviors
//! -------------
//! - The system is solved by SVD in minimum-norm form, so
//!   rank-deficient systems still yield the smallest consistent
//!   solution instead of failing.
//! - Drifting stations that contributed no surviving column receive a
//!   zero backfill `(a, b) = (0, 0)`: their data pass through the
//!   iteration uncorrected rather than desynchronizing the histories.
//! - Outlier rejection overwrites the offending `t_app` entry with NaN
//!   in place; the history keeps its length.
//!
//! Invariants & assumptions
//! ------------------------
//! - After [`solve_drift_system`] every drifting station's coefficient
//!   histories have exactly `iteration` entries.
use crate::drift::errors::{DriftError, DriftResult};
use crate::drift::repository::ClockDrift;
use crate::inversion::design::{build_design_system, DesignSystem, DriftTerm};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

/// Singular values below `DEFAULT_RCOND` × the largest are treated as
/// zero during the minimum-norm solve.
pub const DEFAULT_RCOND: f64 = 1e-10;

/// Assemble and solve the drift system, appending one coefficient pair
/// per drifting station and advancing the iteration counter.
///
/// Parameters
/// ----------
/// - `rcond`: relative singular-value cutoff; `None` uses
///   [`DEFAULT_RCOND`].
///
/// Returns the solved [`DesignSystem`] for inspection.
///
/// Errors
/// ------
/// - `DriftError::NoUsableObservations` when nothing survives design
///   assembly.
/// - `DriftError::Anyhow` when the SVD solve itself fails.
pub fn solve_drift_system(
    cd: &mut ClockDrift, rcond: Option<f64>,
) -> DriftResult<DesignSystem> {
    let system = build_design_system(cd)?;
    let (nrows, ncols) = system.matrix.dim();
    info!(rows = nrows, columns = ncols, "solving drift system");

    let matrix = DMatrix::from_fn(nrows, ncols, |r, c| system.matrix[[r, c]]);
    let observed = DVector::from_fn(nrows, |r, _| system.observed[r]);
    let svd = matrix.svd(true, true);
    let cutoff = rcond.unwrap_or(DEFAULT_RCOND) * svd.singular_values.max();
    let solution = svd
        .solve(&observed, cutoff)
        .map_err(|message| DriftError::Anyhow(message.to_string()))?;

    let mut solved_rates = Vec::new();
    let mut solved_offsets = Vec::new();
    for (column, value) in system.columns.iter().zip(solution.iter()) {
        for station in cd.stations_mut() {
            if station.code != column.station_code {
                continue;
            }
            match column.term {
                DriftTerm::Rate => station.a.push(*value),
                DriftTerm::Offset => station.b.push(*value),
            }
            break;
        }
        match column.term {
            DriftTerm::Rate => solved_rates.push(column.station_code.clone()),
            DriftTerm::Offset => solved_offsets.push(column.station_code.clone()),
        }
        debug!(station = %column.station_code, term = ?column.term, value, "coefficient solved");
    }

    // Coefficients without a surviving column pass through uncorrected.
    // Tracked per term: a station can lose only its rate column when
    // every observation sits at the reference time.
    for station in cd.stations_mut() {
        if !station.needs_correction {
            continue;
        }
        if !solved_rates.contains(&station.code) {
            station.a.push(0.0);
        }
        if !solved_offsets.contains(&station.code) {
            station.b.push(0.0);
        }
    }
    cd.advance_iteration();
    Ok(system)
}

/// Overwrite with NaN every apparent shift whose residual against the
/// model of `iteration` (`None` = latest) exceeds `max_error` seconds
/// in magnitude.
///
/// Correlations touching an excluded station, carrying a NaN shift, or
/// lacking model coefficients at that iteration are left alone.
///
/// Returns the number of rejected observations.
pub fn reject_outliers(
    cd: &mut ClockDrift, max_error: f64, iteration: Option<usize>,
) -> usize {
    let mut rejections: Vec<(usize, usize)> = Vec::new();
    for (index, correlation) in cd.correlations().iter().enumerate() {
        let included = cd
            .station(&correlation.station1_code)
            .map(|s| s.included_in_inversion)
            .unwrap_or(false)
            && cd
                .station(&correlation.station2_code)
                .map(|s| s.included_in_inversion)
                .unwrap_or(false);
        if !included {
            continue;
        }
        let observed = match correlation.t_app.value_at(iteration) {
            Some(value) if value.is_finite() => value,
            _ => continue,
        };
        let predicted = match cd.predicted_shift(correlation, iteration) {
            Some(value) => value,
            None => continue,
        };
        if (observed - predicted).abs() > max_error.abs() {
            let entry = iteration.unwrap_or(correlation.t_app.len() - 1);
            rejections.push((index, entry));
        }
    }

    for &(index, entry) in &rejections {
        cd.correlations_mut()[index].t_app.overwrite(entry, f64::NAN);
    }
    if !rejections.is_empty() {
        info!(rejected = rejections.len(), "apparent shifts rejected as outliers");
    }
    rejections.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::core::params::ProcessingParameters;
    use crate::drift::sources::{MemoryCatalog, ObservationRecord, StationRecord};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact recovery of a linear drift from synthetic shifts.
    // - Zero backfill for a drifting station with no usable data.
    // - Outlier rejection overwriting only residuals past the
    //   threshold.
    // -------------------------------------------------------------------------

    const A_TRUE: f64 = 0.001;
    const B_TRUE: f64 = 0.25;

    fn station_record(code: &str, needs_correction: bool, lat: f64) -> StationRecord {
        StationRecord {
            project: "IMAGE".into(),
            code: code.into(),
            needs_correction,
            latitude: lat,
            longitude: -22.5,
            elevation: 0.0,
            sensor_type: if needs_correction { "OBS".into() } else { "LAND".into() },
        }
    }

    fn observation(s1: &str, s2: &str, day_offset: i64) -> ObservationRecord {
        let epoch = 1_400_000_000 + day_offset * 86_400;
        ObservationRecord {
            station1_code: s1.into(),
            station2_code: s2.into(),
            average_date: Utc.timestamp_opt(epoch, 0).unwrap(),
            number_days: 30.0,
            file_path: PathBuf::from(format!("{}_{}_{}_30", s1, s2, epoch)),
            npts: 4096,
            sampling_rate: 10.0,
            length_of_file_s: 409.6,
            delta: 0.1,
        }
    }

    fn drifting_fixture() -> ClockDrift {
        let catalog = MemoryCatalog {
            stations: vec![
                station_record("O20", true, 63.9),
                station_record("GRV", false, 62.5),
            ],
            observations: (0..6).map(|k| observation("O20", "GRV", k * 20)).collect(),
        };
        let mut cd = ClockDrift::build(
            &catalog,
            &catalog,
            Utc.timestamp_opt(1_400_000_000, 0).unwrap(),
            vec![ProcessingParameters::default()],
        )
        .unwrap();
        for correlation in cd.correlations_mut() {
            let shift = 2.0 * (A_TRUE * correlation.t_n_lps + B_TRUE);
            correlation.t_app.push(shift);
        }
        cd
    }

    #[test]
    // Purpose
    // -------
    // A noiseless linear drift is recovered exactly and the iteration
    // counter advances.
    //
    // Given
    // -----
    // - Six O20-GRV correlations with t_app = 2·(a·t + b) for
    //   a = 0.001, b = 0.25.
    //
    // Expect
    // ------
    // - O20's solved (a, b) match the truth to 1e-9; iteration = 1.
    fn recovers_linear_drift() {
        let mut cd = drifting_fixture();
        solve_drift_system(&mut cd, None).unwrap();

        let o20 = cd.station("O20").unwrap();
        assert!((o20.a.latest().unwrap() - A_TRUE).abs() < 1e-9);
        assert!((o20.b.latest().unwrap() - B_TRUE).abs() < 1e-9);
        assert_eq!(cd.iteration(), 1);
    }

    #[test]
    // Purpose
    // -------
    // A drifting station with only NaN shifts gets the zero backfill so
    // its histories stay aligned.
    //
    // Given
    // -----
    // - The fixture plus a second OBS whose single shift is NaN.
    //
    // Expect
    // ------
    // - O22 ends the iteration with (a, b) = (0, 0).
    fn backfills_unsolved_stations_with_zero() {
        let catalog = MemoryCatalog {
            stations: vec![
                station_record("O20", true, 63.9),
                station_record("O22", true, 64.3),
                station_record("GRV", false, 62.5),
            ],
            observations: (0..6)
                .map(|k| observation("O20", "GRV", k * 20))
                .chain(std::iter::once(observation("O22", "GRV", 0)))
                .collect(),
        };
        let mut cd = ClockDrift::build(
            &catalog,
            &catalog,
            Utc.timestamp_opt(1_400_000_000, 0).unwrap(),
            vec![ProcessingParameters::default()],
        )
        .unwrap();
        for correlation in cd.correlations_mut() {
            if correlation.touches("O22") {
                correlation.t_app.push(f64::NAN);
            } else {
                let shift = 2.0 * (A_TRUE * correlation.t_n_lps + B_TRUE);
                correlation.t_app.push(shift);
            }
        }

        solve_drift_system(&mut cd, None).unwrap();

        let o22 = cd.station("O22").unwrap();
        assert_eq!(o22.a.latest(), Some(0.0));
        assert_eq!(o22.b.latest(), Some(0.0));
        assert_eq!(cd.station("O20").unwrap().a.len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // A station whose rate column is dropped (every observation at the
    // reference time) keeps its solved offset; only the missing rate
    // gets the zero backfill, and both histories end one entry long.
    //
    // Given
    // -----
    // - A single O20-GRV correlation at the reference time with
    //   t_app = 0.4, so the design keeps only O20's offset column.
    //
    // Expect
    // ------
    // - a = [0.0] (backfilled), b = [0.2] (solved, not shadowed).
    fn backfills_only_the_missing_term() {
        let catalog = MemoryCatalog {
            stations: vec![
                station_record("O20", true, 63.9),
                station_record("GRV", false, 62.5),
            ],
            observations: vec![observation("O20", "GRV", 0)],
        };
        let mut cd = ClockDrift::build(
            &catalog,
            &catalog,
            Utc.timestamp_opt(1_400_000_000, 0).unwrap(),
            vec![ProcessingParameters::default()],
        )
        .unwrap();
        cd.correlations_mut()[0].t_app.push(0.4);

        let system = solve_drift_system(&mut cd, None).unwrap();
        assert_eq!(system.columns.len(), 1);

        let o20 = cd.station("O20").unwrap();
        assert_eq!(o20.a.as_slice(), &[0.0]);
        assert_eq!(o20.b.len(), 1);
        assert!((o20.b.latest().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Rejection overwrites only the shift whose residual exceeds the
    // threshold, leaving the history length intact.
    //
    // Given
    // -----
    // - The solved fixture with one shift corrupted by +1.0 s and a
    //   0.5 s threshold.
    //
    // Expect
    // ------
    // - Exactly one rejection; the corrupted entry is NaN, the others
    //   keep their values; every history still has one entry.
    fn rejects_only_large_residuals() {
        let mut cd = drifting_fixture();
        let corrupted = 2.0 * (A_TRUE * cd.correlations()[2].t_n_lps + B_TRUE) + 1.0;
        cd.correlations_mut()[2].t_app.overwrite(0, corrupted);
        solve_drift_system(&mut cd, None).unwrap();

        // The corrupted point perturbs the fit slightly, so re-solve on
        // the cleaned data afterwards in real pipelines; here only the
        // rejection itself is under test.
        let rejected = reject_outliers(&mut cd, 0.5, None);

        assert_eq!(rejected, 1);
        assert!(cd.correlations()[2].t_app.latest().unwrap().is_nan());
        assert!(cd.correlations()[0].t_app.latest().unwrap().is_finite());
        assert!(cd.correlations().iter().all(|c| c.t_app.len() == 1));
    }
}
