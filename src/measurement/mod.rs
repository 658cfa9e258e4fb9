//! measurement — waveform seams, apriori seeding, and apparent-shift
//! sweeps.
//!
//! Purpose
//! -------
//! Everything that touches waveform data lives here, behind traits:
//! reading stacked correlation files ([`WaveformReader`]), lag picking
//! ([`CrossCorrelator`]), and the full time-asymmetry measurement
//! ([`ShiftMeasurer`]). On top of those seams sit the two drivers of
//! the pipeline's measurement phase: [`AprioriEstimator`] for the
//! initial per-pair seeding and [`ApparentShiftService`] for the
//! per-iteration `t_app` sweep.
//!
//! Key behaviors
//! -------------
//! - The estimation core never parses waveform formats or runs signal
//!   processing itself; concrete implementations of the seams are
//!   supplied by the caller (and by mocks in tests).
//! - Sweep failures degrade to NaN readings; only precondition
//!   violations (unseeded aprioris, unpropagated histories) abort.
//!
//! Conventions
//! -----------
//! - Shifts are seconds; lags are samples; conversion uses the sampling
//!   rate of the waveform the lag was picked on.

pub mod apriori;
pub mod shift;
pub mod waveform;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::apriori::{AprioriEstimator, AprioriPolicy, DEFAULT_MAX_LAG_SAMPLES};
pub use self::shift::{ApparentShiftService, ShiftMeasurer, ShiftRequest, ShiftResponse};
pub use self::waveform::{CrossCorrelator, FrequencyBand, LagEstimate, Waveform, WaveformReader};
