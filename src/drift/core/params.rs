//! Processing-parameter bundles for correlation grouping.
//!
//! Purpose
//! -------
//! Provide the immutable value bundle of filter and threshold settings
//! that a correlation was processed under. Correlations are grouped by
//! structural equality of this type, so two bundles compare equal exactly
//! when every field matches.
//!
//! Key behaviors
//! -------------
//! - [`ProcessingParameters::new`] validates the band-pass edges at
//!   construction time (`freqmin < freqmax`).
//! - [`ProcessingParameters::band`] exposes the band as a
//!   [`FrequencyBand`] for the waveform collaborators.
//! - `Default` carries the field defaults of the original processing
//!   chain (0.15–0.3 Hz, 2500 m/s reference velocity, 2 wavelengths
//!   minimum separation, SNR threshold 10, noise window at 240 s,
//!   sampling tolerance 0.004 s).
//!
//! Invariants & assumptions
//! ------------------------
//! - `freqmin < freqmax` always holds after construction.
//! - The bundle is immutable; regrouping requires a new value.
use crate::drift::errors::{DriftError, DriftResult};
use crate::measurement::waveform::FrequencyBand;

/// Immutable filter/threshold settings of one processing regime.
///
/// Fields
/// ------
/// - `freqmin`, `freqmax`: band-pass edges in Hz, `freqmin < freqmax`.
/// - `ref_vel`: reference surface-wave velocity in m/s.
/// - `dist_trh`: minimum station separation in wavelengths.
/// - `snr_trh`: signal-to-noise ratio threshold.
/// - `noise_st`: start of the noise window in seconds.
/// - `dt_err`: tolerance the sampling interval must be a multiple of.
///
/// Equality is structural and is what groups correlations into
/// processing regimes; do not mutate fields after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingParameters {
    /// Low corner of the band-pass filter \[Hz\].
    pub freqmin: f64,
    /// High corner of the band-pass filter \[Hz\].
    pub freqmax: f64,
    /// Reference surface-wave velocity \[m/s\].
    pub ref_vel: f64,
    /// Minimum station separation in terms of wavelength.
    pub dist_trh: f64,
    /// Signal-to-noise ratio threshold.
    pub snr_trh: f64,
    /// Start of the noise window \[s\].
    pub noise_st: f64,
    /// Sampling interval must be a multiple of this value \[s\].
    pub dt_err: f64,
}

impl ProcessingParameters {
    /// Construct a validated [`ProcessingParameters`] bundle.
    ///
    /// Returns
    /// -------
    /// `DriftResult<ProcessingParameters>`
    ///   - `Ok(..)` when `freqmin < freqmax`.
    ///   - `Err(DriftError::InvalidFrequencyBand { .. })` otherwise.
    ///
    /// Notes
    /// -----
    /// - The remaining fields are taken as-is; threshold semantics are
    ///   enforced where they are consumed (measurement boundary).
    pub fn new(
        freqmin: f64, freqmax: f64, ref_vel: f64, dist_trh: f64, snr_trh: f64, noise_st: f64,
        dt_err: f64,
    ) -> DriftResult<Self> {
        if !(freqmin < freqmax) {
            return Err(DriftError::InvalidFrequencyBand { freqmin, freqmax });
        }
        Ok(ProcessingParameters { freqmin, freqmax, ref_vel, dist_trh, snr_trh, noise_st, dt_err })
    }

    /// The band-pass edges as a [`FrequencyBand`].
    pub fn band(&self) -> FrequencyBand {
        FrequencyBand { freqmin: self.freqmin, freqmax: self.freqmax }
    }

    /// Minimum resolvable wavelength for this regime, `ref_vel / freqmax`
    /// in meters.
    pub fn min_wavelength(&self) -> f64 {
        self.ref_vel / self.freqmax
    }
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        ProcessingParameters {
            freqmin: 0.15,
            freqmax: 0.3,
            ref_vel: 2500.0,
            dist_trh: 2.0,
            snr_trh: 10.0,
            noise_st: 240.0,
            dt_err: 0.004,
        }
    }
}
