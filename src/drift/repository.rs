//! The clock-drift aggregate: owned stations, owned correlations, and
//! the queries the estimation pipeline runs against them.
//!
//! Purpose
//! -------
//! [`ClockDrift`] is the single owner of all [`Station`] and
//! [`Correlation`] state for one run. It is built once from a station
//! catalog and a correlation catalog, answers pair/attribute queries,
//! propagates the current drift model into per-correlation
//! instrumental-shift estimates, and tracks the global iteration
//! counter.
//!
//! Key behaviors
//! -------------
//! - The build keeps only stations with at least one matching
//!   observation, skips (with a warning) observations whose codes are
//!   unknown, and never creates a correlation between two stations that
//!   both hold a synchronized clock or between a station and itself.
//! - Correlations reference stations by code; every resolution goes
//!   through [`ClockDrift::station`], never through embedded references.
//! - [`ClockDrift::propagate_drift_model`] appends one
//!   instrumental-shift estimate per correlation side: the drift-model
//!   value when the station has solved coefficients, the seeded apriori
//!   on the first pass, and 0.0 for land stations.
//!
//! Invariants & assumptions
//! ------------------------
//! - `Station.index` values are contiguous from zero in storage order
//!   and fix the design-matrix column layout for the whole run.
//! - Stations and correlations are never removed; exclusion happens via
//!   `included_in_inversion`, not destruction.
use crate::drift::core::correlation::Correlation;
use crate::drift::core::geo::great_circle_distance_m;
use crate::drift::core::history::IterationSeries;
use crate::drift::core::params::ProcessingParameters;
use crate::drift::core::station::Station;
use crate::drift::errors::{DriftError, DriftResult};
use crate::drift::sources::{CorrelationCatalog, StationCatalog};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, warn};

/// Owner of all station and correlation state for one estimation run.
#[derive(Debug, Clone)]
pub struct ClockDrift {
    stations: Vec<Station>,
    correlations: Vec<Correlation>,
    processing_parameters: Vec<ProcessingParameters>,
    reference_time: DateTime<Utc>,
    iteration: usize,
}

impl ClockDrift {
    /// Build the aggregate from a station catalog and a correlation
    /// catalog.
    ///
    /// Parameters
    /// ----------
    /// - `stations`: metadata source; only stations with at least one
    ///   matching observation are kept, indexed in catalog order.
    /// - `observations`: correlation-data source; observations with
    ///   unknown station codes, self-paired codes, or two synchronized
    ///   endpoints are skipped with a warning.
    /// - `reference_time`: the zero of the drift-model time axis.
    /// - `processing_parameters`: every regime in use; one correlation
    ///   is created per observation × regime.
    ///
    /// Errors
    /// ------
    /// - `DriftError::MissingResource` when either catalog is
    ///   unreachable. Individually malformed observations never fail
    ///   the build.
    pub fn build(
        stations: &dyn StationCatalog, observations: &dyn CorrelationCatalog,
        reference_time: DateTime<Utc>, processing_parameters: Vec<ProcessingParameters>,
    ) -> DriftResult<Self> {
        let records = stations.records()?;
        let observed = observations.observations()?;

        let mut kept = Vec::new();
        for record in &records {
            let has_data = observed
                .iter()
                .any(|o| o.station1_code == record.code || o.station2_code == record.code);
            if !has_data {
                warn!(code = %record.code, "no correlation observations found for station");
                continue;
            }
            kept.push(Station::new(
                record.code.clone(),
                kept.len(),
                record.needs_correction,
                record.latitude,
                record.longitude,
                record.elevation,
                record.sensor_type.clone(),
                record.project.clone(),
            ));
        }

        let mut aggregate = ClockDrift {
            stations: kept,
            correlations: Vec::new(),
            processing_parameters,
            reference_time,
            iteration: 0,
        };

        let regimes = aggregate.processing_parameters.clone();
        for observation in &observed {
            if observation.station1_code == observation.station2_code {
                warn!(code = %observation.station1_code, "skipping self-paired observation");
                continue;
            }
            let (station1, station2) = match (
                aggregate.find_station(&observation.station1_code),
                aggregate.find_station(&observation.station2_code),
            ) {
                (Some(s1), Some(s2)) => (s1, s2),
                _ => {
                    warn!(
                        file = %observation.file_path.display(),
                        "skipping observation whose stations are not in the inventory"
                    );
                    continue;
                }
            };
            if !station1.needs_correction && !station2.needs_correction {
                continue;
            }

            let cpl_dist = great_circle_distance_m(
                station1.latitude,
                station1.longitude,
                station2.latitude,
                station2.longitude,
            );
            let t_n_lps =
                (observation.average_date - reference_time).num_seconds() as f64 / 86_400.0;

            for params in &regimes {
                aggregate.correlations.push(Correlation {
                    station1_code: observation.station1_code.clone(),
                    station2_code: observation.station2_code.clone(),
                    average_date: observation.average_date,
                    number_days: observation.number_days,
                    file_path: observation.file_path.clone(),
                    npts: observation.npts,
                    sampling_rate: observation.sampling_rate,
                    length_of_file_s: observation.length_of_file_s,
                    delta: observation.delta,
                    cpl_dist,
                    processing_parameters: *params,
                    t_n_lps,
                    apriori_dt1: None,
                    apriori_dt2: None,
                    dt_ins_station1: IterationSeries::new(),
                    dt_ins_station2: IterationSeries::new(),
                    t_app: IterationSeries::new(),
                    diagnostics: None,
                });
            }
        }

        info!(
            stations = aggregate.stations.len(),
            correlations = aggregate.correlations.len(),
            "clock-drift repository built"
        );
        Ok(aggregate)
    }

    fn find_station(&self, code: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.code == code)
    }

    /// All stations, in design-matrix index order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// All correlations.
    pub fn correlations(&self) -> &[Correlation] {
        &self.correlations
    }

    pub(crate) fn stations_mut(&mut self) -> &mut [Station] {
        &mut self.stations
    }

    pub(crate) fn correlations_mut(&mut self) -> &mut [Correlation] {
        &mut self.correlations
    }

    /// The processing regimes this run groups correlations by.
    pub fn processing_parameters(&self) -> &[ProcessingParameters] {
        &self.processing_parameters
    }

    /// The zero of the drift-model time axis.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// Completed inversion iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub(crate) fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Look up a station by code.
    ///
    /// Errors
    /// ------
    /// - `DriftError::StationNotFound` when no station carries `code`.
    pub fn station(&self, code: &str) -> DriftResult<&Station> {
        self.find_station(code).ok_or_else(|| DriftError::StationNotFound { code: code.into() })
    }

    /// All correlations linking the unordered pair (`station1_code`,
    /// `station2_code`).
    ///
    /// Errors
    /// ------
    /// - `DriftError::SameStationPair` when both codes are equal.
    pub fn station_pair_correlations(
        &self, station1_code: &str, station2_code: &str,
    ) -> DriftResult<Vec<&Correlation>> {
        if station1_code == station2_code {
            return Err(DriftError::SameStationPair { code: station1_code.into() });
        }
        Ok(self.correlations.iter().filter(|c| c.links(station1_code, station2_code)).collect())
    }

    /// All correlations processed under `params` (structural equality).
    pub fn correlations_with_parameters(
        &self, params: &ProcessingParameters,
    ) -> Vec<&Correlation> {
        self.correlations.iter().filter(|c| c.processing_parameters == *params).collect()
    }

    /// All correlations touching `code` on either side.
    pub fn correlations_of_station(&self, code: &str) -> Vec<&Correlation> {
        self.correlations.iter().filter(|c| c.touches(code)).collect()
    }

    /// All correlations averaged at exactly `average_date`.
    pub fn correlations_with_average_date(&self, average_date: DateTime<Utc>) -> Vec<&Correlation> {
        self.correlations.iter().filter(|c| c.average_date == average_date).collect()
    }

    /// The correlation backed by the waveform at `path`.
    ///
    /// Errors
    /// ------
    /// - `DriftError::CorrelationNotFound` when no correlation uses that
    ///   handle.
    pub fn correlation_of_file(&self, path: &Path) -> DriftResult<&Correlation> {
        self.correlations
            .iter()
            .find(|c| c.file_path == path)
            .ok_or_else(|| DriftError::CorrelationNotFound { path: path.display().to_string() })
    }

    /// Append the next instrumental-shift estimate to every correlation.
    ///
    /// Per correlation side: the drift-model value `a·t_N_lps + b` when
    /// the station has solved coefficients, the seeded apriori when it
    /// does not (first pass), and 0.0 for land stations.
    ///
    /// Errors
    /// ------
    /// - `DriftError::StationNotFound` on a dangling station code
    ///   (programming error in the build).
    /// - `DriftError::AprioriNotSeeded` when a correction-needing side
    ///   has neither solved coefficients nor a seeded apriori.
    pub fn propagate_drift_model(&mut self) -> DriftResult<()> {
        for i in 0..self.correlations.len() {
            let (code1, code2, t_n_lps, apriori_dt1, apriori_dt2) = {
                let c = &self.correlations[i];
                (
                    c.station1_code.clone(),
                    c.station2_code.clone(),
                    c.t_n_lps,
                    c.apriori_dt1,
                    c.apriori_dt2,
                )
            };
            let dt1 = self.side_estimate(&code1, &code2, t_n_lps, apriori_dt1, true)?;
            let dt2 = self.side_estimate(&code1, &code2, t_n_lps, apriori_dt2, false)?;
            let correlation = &mut self.correlations[i];
            correlation.dt_ins_station1.push(dt1);
            correlation.dt_ins_station2.push(dt2);
        }
        Ok(())
    }

    fn side_estimate(
        &self, code1: &str, code2: &str, t_n_lps: f64, apriori: Option<f64>, first_side: bool,
    ) -> DriftResult<f64> {
        let code = if first_side { code1 } else { code2 };
        let station = self.station(code)?;
        if !station.needs_correction {
            return Ok(0.0);
        }
        if let Some(value) = station.dt_ins_at(t_n_lps, None) {
            return Ok(value);
        }
        apriori.ok_or_else(|| DriftError::AprioriNotSeeded {
            station1: code1.to_string(),
            station2: code2.to_string(),
        })
    }

    /// The shift the current drift model predicts for `correlation`:
    /// `2·(dt_ins₁ − dt_ins₂)` with coefficients of the requested
    /// iteration (`None` = latest).
    ///
    /// Returns `None` when a correction-needing endpoint has no solved
    /// coefficients at that iteration.
    pub fn predicted_shift(
        &self, correlation: &Correlation, iteration: Option<usize>,
    ) -> Option<f64> {
        let station1 = self.find_station(&correlation.station1_code)?;
        let station2 = self.find_station(&correlation.station2_code)?;
        let dt1 = station1.dt_ins_at(correlation.t_n_lps, iteration)?;
        let dt2 = station2.dt_ins_at(correlation.t_n_lps, iteration)?;
        Some(2.0 * (dt1 - dt2))
    }
}
