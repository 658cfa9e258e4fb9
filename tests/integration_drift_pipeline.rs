//! Integration tests for the full clock-drift estimation pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow on synthetic data: catalog build,
//!   apriori seeding, drift-model propagation, apparent-shift sweep,
//!   inclusion filtering, least-squares solve, and outlier rejection.
//! - Exercise a realistic deployment shape (one drifting OBS against
//!   two synchronized land stations over ten months of correlations)
//!   rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `drift::repository::ClockDrift`:
//!   - Build from in-memory catalogs, model propagation across
//!     iterations, and predicted shifts.
//! - `measurement`:
//!   - `AprioriEstimator` seeding through mock waveform seams and
//!     `ApparentShiftService` sweeps through a synthetic measurer.
//! - `inversion`:
//!   - Default-criteria inclusion filtering on a ten-month campaign,
//!     exact recovery of a linear drift, iteration stability, and the
//!     reject-then-resolve loop around a corrupted observation.
//!
//! Exclusions
//! ----------
//! - Fine-grained behavior of bucketing, design-row coefficients, and
//!   group validation — covered by unit tests in the modules.
//! - Real waveform I/O and signal processing; the seams are mocked
//!   here by construction.
use chrono::{DateTime, TimeZone, Utc};
use ndarray::Array1;
use obsclock::drift::{
    ClockDrift, DriftResult, MemoryCatalog, ObservationRecord, ProcessingParameters,
    StationRecord,
};
use obsclock::inversion::{
    apply_inclusion_filter, reject_outliers, solve_drift_system, InclusionCriteria,
};
use obsclock::measurement::{
    ApparentShiftService, AprioriEstimator, AprioriPolicy, CrossCorrelator, FrequencyBand,
    LagEstimate, ShiftMeasurer, ShiftRequest, ShiftResponse, Waveform, WaveformReader,
};
use std::path::{Path, PathBuf};

/// Route pipeline logs through the test harness so `--nocapture` shows
/// the build/sweep/solve progression. Safe to call from every test;
/// only the first registration wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

const DAY_S: i64 = 86_400;
const EPOCH0: i64 = 1_408_579_200; // 2014-08-21T00:00:00Z
const A_TRUE: f64 = 1.0e-4;
const B_TRUE: f64 = 0.05;

/// Build the synthetic campaign: one drifting OBS (O20) correlated
/// against two synchronized land stations (GRV, HEI) every ten days
/// for three hundred days. All pairs sit well above the minimum
/// resolvable separation at default processing parameters.
fn campaign() -> ClockDrift {
    let stations = vec![
        station("O20", true, 63.9),
        station("GRV", false, 62.5),
        station("HEI", false, 65.3),
    ];
    let mut observations = Vec::new();
    for land in ["GRV", "HEI"] {
        for k in 0..31i64 {
            observations.push(observation("O20", land, k * 10));
        }
    }
    let catalog = MemoryCatalog { stations, observations };
    ClockDrift::build(
        &catalog,
        &catalog,
        reference_time(),
        vec![ProcessingParameters::default()],
    )
    .expect("catalog build")
}

fn reference_time() -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH0, 0).unwrap()
}

fn station(code: &str, needs_correction: bool, lat: f64) -> StationRecord {
    StationRecord {
        project: "IMAGE".into(),
        code: code.into(),
        needs_correction,
        latitude: lat,
        longitude: -23.0,
        elevation: if needs_correction { -1500.0 } else { 30.0 },
        sensor_type: if needs_correction { "OBS".into() } else { "LAND".into() },
    }
}

fn observation(s1: &str, s2: &str, day: i64) -> ObservationRecord {
    let epoch = EPOCH0 + day * DAY_S;
    ObservationRecord {
        station1_code: s1.into(),
        station2_code: s2.into(),
        average_date: Utc.timestamp_opt(epoch, 0).unwrap(),
        number_days: 10.0,
        file_path: PathBuf::from(format!("{}_{}_{}_10", s1, s2, epoch)),
        npts: 8192,
        sampling_rate: 10.0,
        length_of_file_s: 819.2,
        delta: 0.1,
    }
}

struct FlatReader;

impl WaveformReader for FlatReader {
    fn read(&self, _path: &Path) -> DriftResult<Waveform> {
        Ok(Waveform { samples: Array1::zeros(128), sampling_rate: 10.0 })
    }
}

struct ZeroLag;

impl CrossCorrelator for ZeroLag {
    fn best_lag(
        &self, _earliest: &Waveform, _latest: &Waveform, _band: &FrequencyBand,
        _max_lag_samples: usize,
    ) -> DriftResult<LagEstimate> {
        Ok(LagEstimate { lag_samples: 0.0, quality: 1.0 })
    }
}

/// Synthesizes the apparent shift a truly linear O20 drift would
/// produce, reading the average date back out of the file handle. An
/// optional corruption adds a constant to one specific file.
struct SyntheticDrift {
    corrupt_path: Option<PathBuf>,
    corruption: f64,
}

impl SyntheticDrift {
    fn clean() -> Self {
        SyntheticDrift { corrupt_path: None, corruption: 0.0 }
    }
}

impl ShiftMeasurer for SyntheticDrift {
    fn measure(&self, request: &ShiftRequest) -> DriftResult<ShiftResponse> {
        let stem = request.file_path.to_string_lossy();
        let epoch: i64 = stem.split('_').nth(2).expect("epoch field").parse().expect("epoch");
        let t_days = (epoch - EPOCH0) as f64 / DAY_S as f64;
        let mut shift = 2.0 * (A_TRUE * t_days + B_TRUE);
        if self.corrupt_path.as_deref() == Some(request.file_path.as_path()) {
            shift += self.corruption;
        }
        Ok(ShiftResponse { shift: Some(shift), diagnostics: Default::default() })
    }
}

/// Run seeding, propagation, and one apparent-shift sweep.
fn measure_campaign(cd: &mut ClockDrift, measurer: SyntheticDrift) {
    let estimator = AprioriEstimator::new(FlatReader, ZeroLag, AprioriPolicy::SingleSided);
    estimator.seed_all(cd).expect("apriori seeding");
    cd.propagate_drift_model().expect("propagation");
    ApparentShiftService::new(measurer).measure_all(cd).expect("sweep");
}

/// Purpose
/// -------
/// The default inclusion criteria keep a ten-month campaign with
/// twelve usable observations per sixty-day period, and the solve
/// recovers a noiseless linear drift exactly.
///
/// Expect
/// ------
/// - No station excluded; O20 covers six correlation periods.
/// - Solved (a, b) match the truth to 1e-9 and land stations never
///   receive coefficients.
#[test]
fn pipeline_recovers_linear_drift() {
    init_tracing();
    let mut cd = campaign();
    measure_campaign(&mut cd, SyntheticDrift::clean());

    let excluded = apply_inclusion_filter(&mut cd, &InclusionCriteria::default());
    assert!(excluded.is_empty());
    assert_eq!(cd.station("O20").unwrap().correlation_periods.len(), 6);

    let system = solve_drift_system(&mut cd, None).expect("solve");
    assert_eq!(system.columns.len(), 2);
    assert_eq!(system.rows.len(), 62);

    let o20 = cd.station("O20").unwrap();
    assert!((o20.a.latest().unwrap() - A_TRUE).abs() < 1e-9);
    assert!((o20.b.latest().unwrap() - B_TRUE).abs() < 1e-9);
    assert!(cd.station("GRV").unwrap().a.is_empty());
    assert_eq!(cd.iteration(), 1);
}

/// Purpose
/// -------
/// A second iteration driven by the solved model leaves the
/// coefficients where they are: propagation evaluates the model, the
/// sweep re-measures the same shifts, and the re-solve reproduces the
/// same solution.
///
/// Expect
/// ------
/// - Histories grow to two entries with both entries equal to the
///   truth within 1e-9; predicted shifts match the observations.
#[test]
fn second_iteration_is_stable() {
    init_tracing();
    let mut cd = campaign();
    measure_campaign(&mut cd, SyntheticDrift::clean());
    apply_inclusion_filter(&mut cd, &InclusionCriteria::default());
    solve_drift_system(&mut cd, None).expect("first solve");

    cd.propagate_drift_model().expect("second propagation");
    ApparentShiftService::new(SyntheticDrift::clean())
        .measure_all(&mut cd)
        .expect("second sweep");
    let rejected = reject_outliers(&mut cd, 0.05, None);
    assert_eq!(rejected, 0);
    solve_drift_system(&mut cd, None).expect("second solve");

    let o20 = cd.station("O20").unwrap();
    assert_eq!(o20.a.len(), 2);
    assert!((o20.a.latest().unwrap() - A_TRUE).abs() < 1e-9);
    assert!((o20.b.latest().unwrap() - B_TRUE).abs() < 1e-9);
    assert_eq!(cd.iteration(), 2);

    for correlation in cd.correlations() {
        let predicted = cd.predicted_shift(correlation, None).expect("model complete");
        let observed = correlation.latest_t_app().expect("measured");
        assert!((predicted - observed).abs() < 1e-8);
    }
}

/// Purpose
/// -------
/// A single corrupted observation is caught by residual-based
/// rejection, and the re-solve on the cleaned data recovers the truth.
///
/// Expect
/// ------
/// - The first solve deviates from the truth; exactly one rejection at
///   a 0.5 s threshold; the re-solve matches the truth to 1e-9.
#[test]
fn corrupted_observation_is_rejected_and_resolved() {
    init_tracing();
    let corrupt = PathBuf::from(format!("O20_GRV_{}_10", EPOCH0 + 150 * DAY_S));
    let mut cd = campaign();
    measure_campaign(
        &mut cd,
        SyntheticDrift { corrupt_path: Some(corrupt.clone()), corruption: 1.0 },
    );
    apply_inclusion_filter(&mut cd, &InclusionCriteria::default());
    solve_drift_system(&mut cd, None).expect("corrupted solve");

    let o20_b = cd.station("O20").unwrap().b.latest().unwrap();
    assert!((o20_b - B_TRUE).abs() > 1e-6);

    let rejected = reject_outliers(&mut cd, 0.5, None);
    assert_eq!(rejected, 1);
    assert!(cd
        .correlation_of_file(&corrupt)
        .unwrap()
        .latest_t_app()
        .unwrap()
        .is_nan());

    solve_drift_system(&mut cd, None).expect("clean solve");
    let o20 = cd.station("O20").unwrap();
    assert!((o20.a.latest().unwrap() - A_TRUE).abs() < 1e-9);
    assert!((o20.b.latest().unwrap() - B_TRUE).abs() < 1e-9);
}
