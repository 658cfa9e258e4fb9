//! drift — OBS clock-drift domain: records, catalogs, repository, errors.
//!
//! Purpose
//! -------
//! Provide the stateful heart of the clock-drift estimator: the core
//! record types in [`core`], the catalog abstractions and file-backed
//! loaders in [`sources`], the owning [`ClockDrift`] aggregate in
//! [`repository`], and the shared error surface in [`errors`]. The
//! measurement and inversion layers operate on this module's types and
//! report this module's errors.
//!
//! Key behaviors
//! -------------
//! - Load station inventories and correlation observations through the
//!   [`StationCatalog`] / [`CorrelationCatalog`] seams, with file- and
//!   directory-backed implementations for production and an in-memory
//!   one for tests.
//! - Own all run state in [`ClockDrift`]: stations with their drift
//!   coefficients, correlations with their shift histories, the
//!   processing regimes, the reference time, and the iteration counter.
//! - Surface every domain failure as a [`DriftError`] through the
//!   [`DriftResult`] alias.
//!
//! Invariants & assumptions
//! ------------------------
//! - Station codes are unique within a run and are the only link
//!   between correlations and stations.
//! - A correlation always joins two distinct stations of which at least
//!   one needs correction.
//! - Drift-model time is `t_N_lps`, fractional days since the run's
//!   reference time.
//!
//! Conventions
//! -----------
//! - Recoverable per-record problems during loading are logged via
//!   `tracing` and skipped; only unreachable catalogs fail a build.
//! - This module performs no numerical estimation; measurement and
//!   inversion live in their own top-level modules.

pub mod core;
pub mod errors;
pub mod repository;
pub mod sources;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Correlation, IterationSeries, ProcessingParameters, ShiftDiagnostics, Station,
};
pub use self::errors::{DriftError, DriftResult};
pub use self::repository::ClockDrift;
pub use self::sources::{
    CorrelationCatalog, CorrelationDirectory, MemoryCatalog, ObservationRecord, StationCatalog,
    StationFile, StationRecord,
};
