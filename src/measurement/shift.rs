//! Apparent-shift measurement: the request/response boundary to the
//! waveform-domain measurer and the service that drives it.
//!
//! Purpose
//! -------
//! Each inversion iteration needs a fresh apparent-shift reading
//! `t_app` per correlation, taken with the current instrumental-shift
//! estimates applied. The measurement itself is waveform signal
//! processing behind the [`ShiftMeasurer`] trait; this module defines
//! the explicit [`ShiftRequest`] / [`ShiftResponse`] exchange and the
//! [`ApparentShiftService`] that assembles requests from correlation
//! state and records the outcomes.
//!
//! Key behaviors
//! -------------
//! - A correlation whose station separation is below the resolvable
//!   minimum (`cpl_dist / (ref_vel / freqmax) < dist_trh`) records NaN
//!   with an explanatory diagnostic and never reaches the measurer.
//! - A measurer failure is not fatal to the sweep: the correlation
//!   records NaN, the failure is logged, and the sweep continues.
//! - Every sweep appends exactly one `t_app` entry per correlation, so
//!   histories stay aligned with the iteration counter.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both instrumental-shift histories of a correlation must be
//!   non-empty before measurement; the drift model (or the apriori
//!   seed) is propagated first.
use crate::drift::core::correlation::ShiftDiagnostics;
use crate::drift::errors::{DriftError, DriftResult};
use crate::drift::repository::ClockDrift;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything the waveform-domain measurer needs for one reading.
///
/// Fields
/// ------
/// - `file_path`: handle of the stacked correlation waveform.
/// - `station1_code` / `station2_code`: pair identity, for diagnostics.
/// - `npts`: expected sample count of the waveform.
/// - `freqmin` / `freqmax`: band-pass corners in Hz.
/// - `cpl_dist`: inter-station great-circle distance in meters.
/// - `ref_vel`: reference surface-wave velocity in m/s.
/// - `dist_trh`: minimum station separation in minimum wavelengths.
/// - `snr_trh`: signal-to-noise acceptance threshold.
/// - `noise_st`: start of the noise window, seconds from the zero lag.
/// - `apriori_dt1` / `apriori_dt2`: current instrumental-shift
///   estimates to apply before picking the asymmetry.
/// - `dt_err`: acceptance tolerance for the causal/acausal agreement,
///   in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRequest {
    pub file_path: PathBuf,
    pub station1_code: String,
    pub station2_code: String,
    pub npts: usize,
    pub freqmin: f64,
    pub freqmax: f64,
    pub cpl_dist: f64,
    pub ref_vel: f64,
    pub dist_trh: f64,
    pub snr_trh: f64,
    pub noise_st: f64,
    pub apriori_dt1: f64,
    pub apriori_dt2: f64,
    pub dt_err: f64,
}

/// Outcome of one measurement.
///
/// Fields
/// ------
/// - `shift`: the apparent shift in seconds, or `None` when the
///   waveform holds no acceptable reading.
/// - `diagnostics`: SNR values, picked windows, and free-form notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftResponse {
    pub shift: Option<f64>,
    pub diagnostics: ShiftDiagnostics,
}

/// Waveform-domain measurement of the time asymmetry of one stacked
/// cross-correlation.
pub trait ShiftMeasurer {
    /// Measure the apparent shift described by `request`.
    ///
    /// Errors
    /// ------
    /// - Implementation-defined I/O or signal-processing failures. A
    ///   clean "no reliable shift in this waveform" is `Ok` with
    ///   `shift: None`, not an error.
    fn measure(&self, request: &ShiftRequest) -> DriftResult<ShiftResponse>;
}

/// Drives a [`ShiftMeasurer`] across the correlations of a
/// [`ClockDrift`] aggregate.
#[derive(Debug)]
pub struct ApparentShiftService<M> {
    measurer: M,
}

impl<M: ShiftMeasurer> ApparentShiftService<M> {
    pub fn new(measurer: M) -> Self {
        ApparentShiftService { measurer }
    }

    /// Measure every correlation, appending one `t_app` entry to each.
    ///
    /// Errors
    /// ------
    /// - `DriftError::InstrumentalShiftMissing` when a correlation's
    ///   shift histories were never propagated. Measurer failures do
    ///   not propagate; they record NaN and continue.
    pub fn measure_all(&self, cd: &mut ClockDrift) -> DriftResult<()> {
        let mut measured = 0usize;
        let mut rejected = 0usize;
        for index in 0..cd.correlations().len() {
            if self.measure_correlation(cd, index)?.is_some() {
                measured += 1;
            } else {
                rejected += 1;
            }
        }
        info!(measured, rejected, "apparent-shift sweep finished");
        Ok(())
    }

    /// Measure one correlation, appending its `t_app` entry.
    ///
    /// Returns the recorded shift, `None` when NaN was recorded.
    ///
    /// Errors
    /// ------
    /// - `DriftError::InstrumentalShiftMissing` when either
    ///   instrumental-shift history is empty.
    pub fn measure_correlation(
        &self, cd: &mut ClockDrift, index: usize,
    ) -> DriftResult<Option<f64>> {
        let request = self.build_request(cd, index)?;

        let min_separation = request.ref_vel / request.freqmax;
        if request.cpl_dist / min_separation < request.dist_trh {
            let note = format!(
                "station separation {:.0} m below {} minimum wavelengths",
                request.cpl_dist, request.dist_trh
            );
            record(cd, index, None, ShiftDiagnostics { note: Some(note), ..Default::default() });
            return Ok(None);
        }

        match self.measurer.measure(&request) {
            Ok(response) => {
                let shift = response.shift;
                record(cd, index, shift, response.diagnostics);
                Ok(shift)
            }
            Err(error) => {
                warn!(
                    file = %request.file_path.display(),
                    %error,
                    "apparent-shift measurement failed"
                );
                let diagnostics =
                    ShiftDiagnostics { note: Some(error.to_string()), ..Default::default() };
                record(cd, index, None, diagnostics);
                Ok(None)
            }
        }
    }

    fn build_request(&self, cd: &ClockDrift, index: usize) -> DriftResult<ShiftRequest> {
        let correlation = &cd.correlations()[index];
        let (apriori_dt1, apriori_dt2) = match (
            correlation.dt_ins_station1.latest(),
            correlation.dt_ins_station2.latest(),
        ) {
            (Some(dt1), Some(dt2)) => (dt1, dt2),
            _ => {
                return Err(DriftError::InstrumentalShiftMissing {
                    station1: correlation.station1_code.clone(),
                    station2: correlation.station2_code.clone(),
                });
            }
        };
        let params = &correlation.processing_parameters;
        Ok(ShiftRequest {
            file_path: correlation.file_path.clone(),
            station1_code: correlation.station1_code.clone(),
            station2_code: correlation.station2_code.clone(),
            npts: correlation.npts,
            freqmin: params.freqmin,
            freqmax: params.freqmax,
            cpl_dist: correlation.cpl_dist,
            ref_vel: params.ref_vel,
            dist_trh: params.dist_trh,
            snr_trh: params.snr_trh,
            noise_st: params.noise_st,
            apriori_dt1,
            apriori_dt2,
            dt_err: params.dt_err,
        })
    }
}

fn record(cd: &mut ClockDrift, index: usize, shift: Option<f64>, diagnostics: ShiftDiagnostics) {
    let correlation = &mut cd.correlations_mut()[index];
    correlation.t_app.push(shift.unwrap_or(f64::NAN));
    correlation.diagnostics = Some(diagnostics);
}
