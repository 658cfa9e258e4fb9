//! obsclock — clock-drift estimation for ocean-bottom seismometers.
//!
//! Purpose
//! -------
//! Estimate the linear clock drift `f(t) = a·t + b` of free-running OBS
//! clocks from the time asymmetry of ambient-noise cross-correlations
//! against reference stations with synchronized clocks, following the
//! iterative least-squares scheme of Naranjo et al. (2021). The crate
//! root only stitches the three layers together; all behavior lives in
//! the modules.
//!
//! Key behaviors
//! -------------
//! - [`drift`] owns the domain state: station inventories, correlation
//!   records with their per-iteration histories, the catalogs that load
//!   them, and the [`drift::ClockDrift`] aggregate.
//! - [`measurement`] seeds apriori shift estimates and sweeps apparent
//!   shifts through caller-supplied waveform seams.
//! - [`inversion`] filters under-observed stations, assembles the
//!   design system, solves it by minimum-norm SVD, and rejects
//!   outliers against the solved model.
//!
//! Invariants & assumptions
//! ------------------------
//! - Time on the drift axis is fractional days since the run's
//!   reference time; shifts and drift values are seconds.
//! - Iteratively refined quantities are append-only histories; a value
//!   that fails later scrutiny is overwritten with NaN in place, never
//!   removed, so histories stay aligned with the iteration counter.
//! - The crate performs no waveform signal processing itself; readers,
//!   correlators, and shift measurers are supplied behind traits.
//!
//! Conventions
//! -----------
//! - A drifting station is one with `needs_correction` set (an OBS); a
//!   synchronized station (land) contributes zero instrumental shift
//!   by definition.
//! - Recoverable per-record problems are logged via `tracing` and
//!   skipped; hard failures surface as [`drift::DriftError`].
//!
//! Downstream usage
//! ----------------
//! - Typical end-to-end flow:
//!   1. Build a [`drift::ClockDrift`] from a [`drift::StationCatalog`]
//!      and a [`drift::CorrelationCatalog`].
//!   2. Seed aprioris with [`measurement::AprioriEstimator`], then
//!      propagate them via `ClockDrift::propagate_drift_model`.
//!   3. Sweep apparent shifts with
//!      [`measurement::ApparentShiftService`].
//!   4. Filter inclusion ([`inversion::apply_inclusion_filter`]) and
//!      solve ([`inversion::solve_drift_system`]).
//!   5. Reject outliers, propagate the new model, and repeat from
//!      step 3 until the coefficients settle.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each module; the full pipeline on
//!   synthetic drift data is exercised in the integration tests.

pub mod drift;
pub mod inversion;
pub mod measurement;
