//! Station inclusion filtering: correlation-period counting and the
//! fixed-point exclusion of under-observed stations.
//!
//! Purpose
//! -------
//! A station with too few usable apparent-shift observations would
//! destabilize the least-squares system. This module buckets each
//! station's successful observations into correlation periods (dates
//! closer than `days_apart` share a bucket) and repeatedly excludes
//! stations that fail the period criteria, recounting after each
//! exclusion until the set is stable.
//!
//! Key behaviors
//! -------------
//! - Only correlations whose latest `t_app` is finite count, and only
//!   when the partner station is still included.
//! - Exclusion is monotone: once a station is out it stays out for the
//!   rest of the filter run, and the recount no longer sees its
//!   correlations.
//! - A date joins the most recently created bucket within the
//!   `days_apart` window; an exact date match always joins its own
//!   bucket first.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bucketing is day-granular; intra-day time differences never split
//!   a bucket.
//! - The filter terminates: each pass either excludes a station or
//!   stops, and there are finitely many stations.
use crate::drift::repository::ClockDrift;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// Thresholds of the inclusion filter.
///
/// Fields
/// ------
/// - `days_apart`: bucket window in days; dates closer than this share
///   a correlation period.
/// - `min_correlation_periods`: periods a station must cover to stay
///   in the inversion.
/// - `min_correlations_obs` / `min_correlations_land`: observations a
///   period needs to count, for drifting and synchronized stations
///   respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusionCriteria {
    pub days_apart: f64,
    pub min_correlation_periods: usize,
    pub min_correlations_obs: usize,
    pub min_correlations_land: usize,
}

impl Default for InclusionCriteria {
    fn default() -> Self {
        InclusionCriteria {
            days_apart: 60.0,
            min_correlation_periods: 3,
            min_correlations_obs: 8,
            min_correlations_land: 5,
        }
    }
}

/// Bucket day-granular dates into correlation periods.
///
/// Parameters
/// ----------
/// - `dates`: observation dates, in any order.
/// - `days_apart`: bucket window in days.
///
/// Returns
/// -------
/// Bucket representative date (the first date that opened the bucket)
/// mapped to the number of member dates. A date joins an existing
/// bucket on an exact match, otherwise the most recently created
/// bucket within the window, otherwise it opens a new bucket.
pub fn count_correlation_periods(
    dates: &[NaiveDate], days_apart: f64,
) -> BTreeMap<NaiveDate, usize> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();

    // Creation order matters for window joining, so buckets live in a
    // Vec until the counts are final.
    let mut buckets: Vec<(NaiveDate, usize)> = Vec::new();
    'dates: for date in sorted {
        for bucket in buckets.iter_mut() {
            if bucket.0 == date {
                bucket.1 += 1;
                continue 'dates;
            }
        }
        for bucket in buckets.iter_mut().rev() {
            let gap = (date - bucket.0).num_days().unsigned_abs() as f64;
            if gap < days_apart {
                bucket.1 += 1;
                continue 'dates;
            }
        }
        buckets.push((date, 1));
    }
    buckets.into_iter().collect()
}

/// Run the inclusion filter to its fixed point.
///
/// Marks every station included, counts each station's correlation
/// periods from finite-`t_app` correlations with still-included
/// partners, and excludes stations below the thresholds one at a time
/// (recounting after each) until no further station falls out. The
/// final per-station period counts are stored on the stations.
///
/// Returns the codes of the excluded stations.
pub fn apply_inclusion_filter(
    cd: &mut ClockDrift, criteria: &InclusionCriteria,
) -> Vec<String> {
    for station in cd.stations_mut() {
        station.included_in_inversion = true;
    }

    let mut excluded = Vec::new();
    loop {
        recount_all(cd, criteria.days_apart);

        let culprit = cd.stations().iter().find_map(|station| {
            if !station.included_in_inversion {
                return None;
            }
            let min_correlations = if station.needs_correction {
                criteria.min_correlations_obs
            } else {
                criteria.min_correlations_land
            };
            let periods = station
                .correlation_periods
                .values()
                .filter(|&&count| count >= min_correlations)
                .count();
            if periods < criteria.min_correlation_periods {
                Some(station.code.clone())
            } else {
                None
            }
        });

        match culprit {
            Some(code) => {
                info!(station = %code, "excluding under-observed station from inversion");
                for station in cd.stations_mut() {
                    if station.code == code {
                        station.included_in_inversion = false;
                    }
                }
                excluded.push(code);
            }
            None => break,
        }
    }
    excluded
}

/// Recount the correlation periods of every included station, ignoring
/// correlations that touch an excluded station.
fn recount_all(cd: &mut ClockDrift, days_apart: f64) {
    let included: Vec<(String, bool)> = cd
        .stations()
        .iter()
        .map(|s| (s.code.clone(), s.included_in_inversion))
        .collect();
    let is_included =
        |code: &str| included.iter().any(|(c, inc)| c == code && *inc);

    let mut counts: Vec<(String, BTreeMap<NaiveDate, usize>)> = Vec::new();
    for (code, station_included) in &included {
        if !station_included {
            continue;
        }
        let dates: Vec<NaiveDate> = cd
            .correlations()
            .iter()
            .filter(|c| {
                c.touches(code)
                    && c.latest_t_app().map(f64::is_finite).unwrap_or(false)
                    && is_included(&c.station1_code)
                    && is_included(&c.station2_code)
            })
            .map(|c| c.average_date.date_naive())
            .collect();
        counts.push((code.clone(), count_correlation_periods(&dates, days_apart)));
    }

    for (code, periods) in counts {
        for station in cd.stations_mut() {
            if station.code == code {
                station.correlation_periods = periods;
                break;
            }
        }
    }
}
