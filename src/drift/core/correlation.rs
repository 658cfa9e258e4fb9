//! Correlation entities: one averaged cross-correlation per station pair,
//! date, and processing regime.
//!
//! Purpose
//! -------
//! Hold the raw metadata of one averaged ambient-noise cross-correlation
//! plus the per-iteration bookkeeping the inversion accumulates on it:
//! the seeded apriori shifts, the instrumental-shift estimates fed to the
//! external measurement routine, and the measured apparent shifts.
//!
//! Key behaviors
//! -------------
//! - Station order (`station1_code`, `station2_code`) fixes the sign
//!   convention of the measured asymmetry and never changes.
//! - Apriori shifts are `Option<f64>`: `None` means never seeded, which
//!   is distinct from a seeded value of 0.0.
//! - `dt_ins_station1/2` and `t_app` are [`IterationSeries`] values;
//!   `t_app` entries may later be overwritten to NaN by outlier
//!   rejection, permanently excluding that observation from subsequent
//!   design-matrix builds at that iteration.
//!
//! Invariants & assumptions
//! ------------------------
//! - A correlation exists only between two different stations, at least
//!   one of which needs correction (enforced by the repository build).
//! - Stations are referenced by code only; resolving a code goes through
//!   the owning repository, never through an embedded reference.
use crate::drift::core::history::IterationSeries;
use crate::drift::core::params::ProcessingParameters;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Diagnostic by-products of one apparent-shift measurement.
///
/// Kept for plotting and reporting collaborators only; nothing in the
/// inversion reads these fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftDiagnostics {
    /// Signal-to-noise ratio of the causal branch.
    pub snr_causal: Option<f64>,
    /// Signal-to-noise ratio of the acausal branch.
    pub snr_acausal: Option<f64>,
    /// Sample-index window delimiting the causal lobe.
    pub causal_window: Option<(usize, usize)>,
    /// Sample-index window delimiting the acausal lobe.
    pub acausal_window: Option<(usize, usize)>,
    /// Free-form note from the measurement boundary (e.g. the reason a
    /// pair was skipped).
    pub note: Option<String>,
}

/// One averaged cross-correlation observation of a station pair.
///
/// Fields
/// ------
/// - `station1_code`, `station2_code`: ordered foreign keys into the
///   repository's stations; the order fixes the asymmetry sign.
/// - `average_date`: midpoint of the averaging window.
/// - `number_days`: how many daily correlations were averaged.
/// - `file_path`: opaque handle to the waveform resource.
/// - `npts`, `sampling_rate`, `length_of_file_s`, `delta`: waveform
///   metadata from the catalog.
/// - `cpl_dist`: great-circle station separation \[m\].
/// - `processing_parameters`: the regime this trace was processed under;
///   grouping compares these structurally.
/// - `t_n_lps`: days from the run's reference time to `average_date`;
///   the independent variable of the drift model.
/// - `apriori_dt1`, `apriori_dt2`: seeded shift attributed to each side,
///   `None` until the apriori estimator runs.
/// - `dt_ins_station1/2`: per-iteration instrumental-shift estimates fed
///   to the external measurement.
/// - `t_app`: per-iteration measured apparent shift (NaN = attempted,
///   unresolved).
/// - `diagnostics`: by-products of the most recent measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub station1_code: String,
    pub station2_code: String,
    pub average_date: DateTime<Utc>,
    pub number_days: f64,
    pub file_path: PathBuf,
    pub npts: usize,
    pub sampling_rate: f64,
    pub length_of_file_s: f64,
    pub delta: f64,
    pub cpl_dist: f64,
    pub processing_parameters: ProcessingParameters,
    pub t_n_lps: f64,
    pub apriori_dt1: Option<f64>,
    pub apriori_dt2: Option<f64>,
    pub dt_ins_station1: IterationSeries,
    pub dt_ins_station2: IterationSeries,
    pub t_app: IterationSeries,
    pub diagnostics: Option<ShiftDiagnostics>,
}

impl Correlation {
    /// Whether `code` is one of the two endpoint stations.
    pub fn touches(&self, code: &str) -> bool {
        self.station1_code == code || self.station2_code == code
    }

    /// Whether this correlation links the unordered pair (`a`, `b`).
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.station1_code == a && self.station2_code == b)
            || (self.station1_code == b && self.station2_code == a)
    }

    /// Whether the apriori shift has been seeded on both sides.
    pub fn apriori_seeded(&self) -> bool {
        self.apriori_dt1.is_some() && self.apriori_dt2.is_some()
    }

    /// The latest measured apparent shift, `None` while measurement has
    /// never run for this correlation.
    pub fn latest_t_app(&self) -> Option<f64> {
        self.t_app.latest()
    }

    /// Whether the latest measurement attempt resolved a shift.
    pub fn has_resolved_shift(&self) -> bool {
        matches!(self.latest_t_app(), Some(v) if !v.is_nan())
    }
}
