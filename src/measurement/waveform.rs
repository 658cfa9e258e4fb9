//! Waveform containers and external signal-processing contracts.
//!
//! Purpose
//! -------
//! Define the narrow boundary to the trace-container and signal-processing
//! collaborators the core does not implement itself: reading a correlation
//! waveform from its opaque handle, and the band-limited signed-lag
//! cross-correlation used to bootstrap apriori shifts.
//!
//! Key behaviors
//! -------------
//! - [`WaveformReader`] resolves a file handle into a [`Waveform`]; a
//!   missing or unreadable resource surfaces as
//!   `DriftError::MissingResource`.
//! - [`CrossCorrelator`] receives two equal-format series and a
//!   [`FrequencyBand`], band-pass filters them, and returns the signed
//!   lag (in samples) maximizing similarity inside a bounded search
//!   window, together with a quality score.
//!
//! Conventions
//! -----------
//! - A positive lag means the second series trails the first.
//! - Implementations are injected by the caller; tests use in-memory
//!   mocks, production wires a trace-format reader and a DSP routine.
use crate::drift::errors::DriftResult;
use ndarray::Array1;
use std::path::Path;

/// Band-pass corner frequencies \[Hz\] handed to signal collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub freqmin: f64,
    pub freqmax: f64,
}

/// One correlation waveform in memory.
///
/// Fields
/// ------
/// - `samples`: amplitude series, zero lag at the center of the trace.
/// - `sampling_rate`: samples per second.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Array1<f64>,
    pub sampling_rate: f64,
}

impl Waveform {
    /// Number of samples.
    pub fn npts(&self) -> usize {
        self.samples.len()
    }

    /// Sampling interval \[s\].
    pub fn delta(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Trace length \[s\].
    pub fn duration_s(&self) -> f64 {
        self.npts() as f64 / self.sampling_rate
    }
}

/// Result of a bounded signed-lag cross-correlation search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagEstimate {
    /// Signed best lag in samples (positive: second series trails).
    pub lag_samples: f64,
    /// Similarity value at the best lag.
    pub quality: f64,
}

/// Trace-container boundary: resolve an opaque waveform handle.
pub trait WaveformReader {
    /// Read the waveform stored at `path`.
    ///
    /// Errors
    /// ------
    /// - `DriftError::MissingResource` when the handle cannot be
    ///   resolved or the container cannot be parsed.
    fn read(&self, path: &Path) -> DriftResult<Waveform>;
}

/// Signal-processing boundary: band-limited lag search between two
/// equal-format waveforms.
pub trait CrossCorrelator {
    /// Band-pass filter both series and return the signed lag (within
    /// `max_lag_samples` of zero) maximizing cross-correlation
    /// similarity, with its quality value.
    fn best_lag(
        &self, earliest: &Waveform, latest: &Waveform, band: &FrequencyBand,
        max_lag_samples: usize,
    ) -> DriftResult<LagEstimate>;
}
