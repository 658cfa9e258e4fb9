//! Station entities and the per-station drift model.
//!
//! Purpose
//! -------
//! Represent one seismic station: identity, location, whether its clock
//! needs correction, and the evolving linear drift-model coefficients
//! accumulated across inversion iterations. Only correction-needing
//! stations (OBS) ever receive non-trivial coefficients; land stations
//! are a perfect time reference with a = b = 0 at every iteration.
//!
//! Key behaviors
//! -------------
//! - [`Station::dt_ins_at`] evaluates the drift model f(t) = a·t + b at a
//!   given elapsed-days coordinate for a chosen iteration.
//! - Coefficient histories are [`IterationSeries`] values, appended once
//!   per completed solve and kept length-aligned across stations by the
//!   solver's zero backfill.
//! - `included_in_inversion` and `correlation_periods` are rewritten by
//!   the inclusion filter every time it runs.
//!
//! Invariants & assumptions
//! ------------------------
//! - `index` is the zero-based position fixing this station's two
//!   unknowns in the design matrix; it never changes after the
//!   repository build.
//! - Land stations keep empty `a`/`b` series for their whole lifetime.
//! - Stations are created once per run and never destroyed.
use crate::drift::core::history::IterationSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One station of the deployment, land or ocean bottom.
///
/// Fields
/// ------
/// - `code`: unique station identifier.
/// - `index`: zero-based design-matrix position (two unknowns per
///   station, columns `2·index` and `2·index + 1`).
/// - `needs_correction`: true for OBS instruments with an unsynchronized
///   clock, false for land-referenced stations.
/// - `latitude`, `longitude`, `elevation`: location; elevation may be a
///   parsed placeholder (0.0).
/// - `sensor_type`, `project`: catalog metadata carried for reporting.
/// - `a`, `b`: drift-model coefficient histories, one entry per solved
///   iteration (empty until the first solve; always empty for land).
/// - `included_in_inversion`: whether the inclusion filter currently
///   trusts this station's observations.
/// - `correlation_periods`: observation-date buckets and their counts,
///   as last computed by the inclusion filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub code: String,
    pub index: usize,
    pub needs_correction: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub sensor_type: String,
    pub project: String,
    pub a: IterationSeries,
    pub b: IterationSeries,
    pub included_in_inversion: bool,
    pub correlation_periods: BTreeMap<NaiveDate, usize>,
}

impl Station {
    /// Construct a station with empty coefficient histories, included in
    /// the inversion until the filter says otherwise.
    pub fn new(
        code: impl Into<String>, index: usize, needs_correction: bool, latitude: f64,
        longitude: f64, elevation: f64, sensor_type: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Station {
            code: code.into(),
            index,
            needs_correction,
            latitude,
            longitude,
            elevation,
            sensor_type: sensor_type.into(),
            project: project.into(),
            a: IterationSeries::new(),
            b: IterationSeries::new(),
            included_in_inversion: true,
            correlation_periods: BTreeMap::new(),
        }
    }

    /// Instrumental time offset of this station at elapsed-days `t_n_lps`
    /// for the chosen iteration (`None` = latest).
    ///
    /// Returns
    /// -------
    /// - `Some(0.0)` for land stations (perfect reference at every
    ///   iteration).
    /// - `Some(a·t + b)` for correction-needing stations with a solved
    ///   coefficient pair at that iteration.
    /// - `None` for correction-needing stations that have no solution at
    ///   that iteration yet.
    pub fn dt_ins_at(&self, t_n_lps: f64, iteration: Option<usize>) -> Option<f64> {
        if !self.needs_correction {
            return Some(0.0);
        }
        let a_val = self.a.value_at(iteration)?;
        let b_val = self.b.value_at(iteration)?;
        Some(a_val * t_n_lps + b_val)
    }

    /// Whether this station has at least one solved coefficient pair.
    pub fn has_solution(&self) -> bool {
        !self.a.is_empty() && !self.b.is_empty()
    }
}
