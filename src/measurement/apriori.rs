//! Apriori clock-shift seeding from the earliest/latest correlation of
//! each station pair.
//!
//! Purpose
//! -------
//! Before the first inversion there is no drift model to predict
//! instrumental shifts from. [`AprioriEstimator`] bootstraps the
//! estimate per station pair and processing regime: it cross-correlates
//! the earliest against the latest stacked waveform of the pair, turns
//! the best lag into a drift rate, and seeds every correlation of the
//! group with the rate interpolated to its own average date.
//!
//! Key behaviors
//! -------------
//! - A pair/regime group with a single correlation is seeded with zero
//!   on both sides; there is nothing to difference against.
//! - The attribution of the pairwise shift to the two sides follows the
//!   configured [`AprioriPolicy`].
//! - Groups are validated before any waveform is read: uniform
//!   processing parameters and uniform station ordering.
//!
//! Invariants & assumptions
//! ------------------------
//! - The rate is formed from exactly two waveforms (earliest, latest);
//!   intermediate correlations only receive interpolated values.
//! - Lag-to-time conversion uses the earliest waveform's sampling rate.
use crate::drift::core::correlation::Correlation;
use crate::drift::errors::{DriftError, DriftResult};
use crate::drift::repository::ClockDrift;
use crate::measurement::waveform::{CrossCorrelator, WaveformReader};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Default search window, in samples, for the apriori lag scan.
pub const DEFAULT_MAX_LAG_SAMPLES: usize = 1000;

/// How the pairwise apriori shift is attributed to the two stations of
/// a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AprioriPolicy {
    /// Assign the full shift, with positive sign, to the side that
    /// needs correction (the first side when both do).
    SingleSided,
    /// Assign the negated shift: split evenly when both sides need
    /// correction, in full to the single side that does otherwise.
    SplitCorrected,
}

/// Seeds `apriori_dt1` / `apriori_dt2` on every correlation of a
/// [`ClockDrift`] aggregate.
///
/// Fields
/// ------
/// - `reader`: loads stacked correlation waveforms from their file
///   handles.
/// - `correlator`: finds the best lag between two waveforms inside a
///   frequency band.
/// - `policy`: side-attribution rule for the pairwise shift.
/// - `max_lag_samples`: half-width of the lag search window.
#[derive(Debug)]
pub struct AprioriEstimator<R, C> {
    reader: R,
    correlator: C,
    policy: AprioriPolicy,
    max_lag_samples: usize,
}

impl<R: WaveformReader, C: CrossCorrelator> AprioriEstimator<R, C> {
    pub fn new(reader: R, correlator: C, policy: AprioriPolicy) -> Self {
        AprioriEstimator { reader, correlator, policy, max_lag_samples: DEFAULT_MAX_LAG_SAMPLES }
    }

    pub fn with_max_lag(mut self, max_lag_samples: usize) -> Self {
        self.max_lag_samples = max_lag_samples;
        self
    }

    /// Seed the apriori shifts of every correlation in `cd`.
    ///
    /// Groups correlations by unordered station pair and processing
    /// regime, then seeds each group independently.
    ///
    /// Errors
    /// ------
    /// - Group validation errors (`MixedProcessingParameters`,
    ///   `InconsistentStationPair`).
    /// - Any reader or correlator failure on the earliest/latest
    ///   waveforms of a group.
    pub fn seed_all(&self, cd: &mut ClockDrift) -> DriftResult<()> {
        let station_codes: Vec<String> =
            cd.stations().iter().map(|s| s.code.clone()).collect();
        let regimes = cd.processing_parameters().to_vec();

        for (i, code1) in station_codes.iter().enumerate() {
            for code2 in &station_codes[i + 1..] {
                for params in &regimes {
                    let group: Vec<usize> = cd
                        .correlations()
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| {
                            c.links(code1, code2) && c.processing_parameters == *params
                        })
                        .map(|(idx, _)| idx)
                        .collect();
                    if group.is_empty() {
                        continue;
                    }
                    self.seed_group(cd, &group)?;
                }
            }
        }
        Ok(())
    }

    /// Seed one pair/regime group, addressed by correlation indices.
    fn seed_group(&self, cd: &mut ClockDrift, group: &[usize]) -> DriftResult<()> {
        if group.len() == 1 {
            let correlation = &mut cd.correlations_mut()[group[0]];
            correlation.apriori_dt1 = Some(0.0);
            correlation.apriori_dt2 = Some(0.0);
            return Ok(());
        }

        let (earliest_date, shift_rate) = {
            let members: Vec<&Correlation> =
                group.iter().map(|&idx| &cd.correlations()[idx]).collect();
            self.pair_shift_rate(&members)?
        };

        let station1_needs = {
            let code = cd.correlations()[group[0]].station1_code.clone();
            cd.station(&code)?.needs_correction
        };
        let station2_needs = {
            let code = cd.correlations()[group[0]].station2_code.clone();
            cd.station(&code)?.needs_correction
        };

        for &idx in group {
            let correlation = &mut cd.correlations_mut()[idx];
            let elapsed_days =
                (correlation.average_date - earliest_date).num_seconds() as f64 / 86_400.0;
            let dt = shift_rate * elapsed_days;
            let (dt1, dt2) =
                attribute_shift(dt, self.policy, station1_needs, station2_needs);
            correlation.apriori_dt1 = Some(dt1);
            correlation.apriori_dt2 = Some(dt2);
        }
        Ok(())
    }

    /// Estimate the pairwise drift rate of a validated group, in
    /// seconds per day, together with the group's earliest average
    /// date. A group whose dates all coincide has no rate to estimate
    /// and yields zero without touching any waveform.
    ///
    /// Errors
    /// ------
    /// - `DriftError::TooFewCorrelations` below two members.
    /// - `DriftError::MixedProcessingParameters` when the group spans
    ///   more than one regime.
    /// - `DriftError::InconsistentStationPair` when the station
    ///   ordering flips within the group.
    fn pair_shift_rate(
        &self, correlations: &[&Correlation],
    ) -> DriftResult<(DateTime<Utc>, f64)> {
        if correlations.len() < 2 {
            return Err(DriftError::TooFewCorrelations { found: correlations.len() });
        }
        let params = correlations[0].processing_parameters;
        if correlations.iter().any(|c| c.processing_parameters != params) {
            return Err(DriftError::MixedProcessingParameters);
        }
        let (code1, code2) =
            (&correlations[0].station1_code, &correlations[0].station2_code);
        if correlations
            .iter()
            .any(|c| c.station1_code != *code1 || c.station2_code != *code2)
        {
            return Err(DriftError::InconsistentStationPair);
        }

        let earliest = correlations
            .iter()
            .min_by_key(|c| c.average_date)
            .ok_or(DriftError::TooFewCorrelations { found: 0 })?;
        let latest = correlations
            .iter()
            .max_by_key(|c| c.average_date)
            .ok_or(DriftError::TooFewCorrelations { found: 0 })?;

        // Without temporal separation there is no rate to difference
        // out; seed zero like the single-correlation case.
        if latest.average_date == earliest.average_date {
            warn!(
                station1 = %code1,
                station2 = %code2,
                "correlation group has no temporal spread; seeding zero rate"
            );
            return Ok((earliest.average_date, 0.0));
        }

        let earliest_waveform = self.reader.read(&earliest.file_path)?;
        let latest_waveform = self.reader.read(&latest.file_path)?;
        let lag = self.correlator.best_lag(
            &earliest_waveform,
            &latest_waveform,
            &params.band(),
            self.max_lag_samples,
        )?;

        let time_shift = lag.lag_samples / earliest_waveform.sampling_rate;
        let elapsed_days =
            (latest.average_date - earliest.average_date).num_seconds() as f64 / 86_400.0;
        let shift_rate = time_shift / elapsed_days;
        debug!(
            station1 = %code1,
            station2 = %code2,
            time_shift,
            elapsed_days,
            "apriori shift rate estimated"
        );
        Ok((earliest.average_date, shift_rate))
    }
}

fn attribute_shift(
    dt: f64, policy: AprioriPolicy, station1_needs: bool, station2_needs: bool,
) -> (f64, f64) {
    match policy {
        AprioriPolicy::SingleSided => {
            if station1_needs {
                (dt, 0.0)
            } else if station2_needs {
                (0.0, dt)
            } else {
                warn!("apriori attribution requested for a fully synchronized pair");
                (0.0, 0.0)
            }
        }
        AprioriPolicy::SplitCorrected => match (station1_needs, station2_needs) {
            (true, true) => (-dt / 2.0, -dt / 2.0),
            (true, false) => (-dt, 0.0),
            (false, true) => (0.0, -dt),
            (false, false) => {
                warn!("apriori attribution requested for a fully synchronized pair");
                (0.0, 0.0)
            }
        },
    }
}
