use crate::physics::OrbitalState;
use crate::sources::SolarCondition;

use super::types::{FeatureRow, RiskLevel};

/// Nearest-date join tolerance for matching solar data to an epoch.
const JOIN_TOLERANCE_DAYS: i64 = 1;

/// Lag windows (in records) for the altitude deltas. TLE history is
/// roughly daily, so a 7-record lag approximates a 7-day delta.
const LAG_7D: usize = 7;
const LAG_30D: usize = 30;

/// Composite drag vulnerability score: lower altitude, higher
/// eccentricity and stronger solar flux all raise it.
pub fn drag_vulnerability(altitude_km: f64, eccentricity: f64, f107: f64) -> f64 {
    (500.0 - altitude_km) / 100.0 * (1.0 + 10.0 * eccentricity) * (f107 / 100.0)
}

/// Risk label from the 7-day altitude delta. Fixed bin edges:
/// ≤ −35 km over 7 days (≈ −5 km/day) is high, ≤ −7 km is medium,
/// anything slower is low.
pub fn label_for_delta7(altitude_7d_decay: f64) -> RiskLevel {
    if altitude_7d_decay <= -35.0 {
        RiskLevel::High
    } else if altitude_7d_decay <= -7.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Nearest solar snapshot within the join tolerance, or `None` when
/// the record has no usable solar match and must be dropped.
pub fn nearest_solar<'a>(
    solar: &'a [SolarCondition],
    epoch: chrono::DateTime<chrono::Utc>,
) -> Option<&'a SolarCondition> {
    let tolerance = chrono::Duration::days(JOIN_TOLERANCE_DAYS);
    solar
        .iter()
        .min_by_key(|s| (s.timestamp - epoch).abs())
        .filter(|s| (s.timestamp - epoch).abs() <= tolerance)
}

/// Derive labeled feature rows from an orbital time series and a solar
/// series.
///
/// The orbital series is sorted ascending by epoch before any lagged
/// feature is computed; rows in the leading 7/30-record window have no
/// defined delta and are dropped, but only after derivation so that
/// window features are computed from the full series. Records without
/// a solar match inside the 1-day tolerance are dropped at the join.
pub fn derive_features(
    mut states: Vec<OrbitalState>,
    solar: &[SolarCondition],
    labeled: bool,
) -> Vec<FeatureRow> {
    states.sort_by_key(|s| s.epoch);

    let mut rows = Vec::with_capacity(states.len());
    for (i, state) in states.iter().enumerate() {
        let Some(solar_match) = nearest_solar(solar, state.epoch) else {
            continue;
        };

        let delta7 = (i >= LAG_7D).then(|| state.altitude_km - states[i - LAG_7D].altitude_km);
        let delta30 = (i >= LAG_30D).then(|| state.altitude_km - states[i - LAG_30D].altitude_km);

        // Trailing 7-record f10.7 average over the joined series.
        let window_start = i.saturating_sub(LAG_7D - 1);
        let window = &states[window_start..=i];
        let mut sum = 0.0;
        let mut count = 0usize;
        for s in window {
            if let Some(m) = nearest_solar(solar, s.epoch) {
                sum += m.f107;
                count += 1;
            }
        }
        let f107_7d_avg = if count > 0 {
            sum / count as f64
        } else {
            solar_match.f107
        };

        // The 7-day delta is required for every row (it feeds both the
        // label and the feature vector); the 30-day delta degrades to
        // zero when the series is shorter than the window.
        let Some(altitude_7d_decay) = delta7 else {
            continue;
        };
        let altitude_30d_decay = delta30.unwrap_or(0.0);

        rows.push(FeatureRow {
            epoch: state.epoch,
            altitude_km: state.altitude_km,
            eccentricity: state.eccentricity,
            mean_motion: state.mean_motion,
            altitude_7d_decay,
            altitude_30d_decay,
            f107_current: solar_match.f107,
            f107_7d_avg,
            drag_vulnerability: drag_vulnerability(
                state.altitude_km,
                state.eccentricity,
                solar_match.f107,
            ),
            label: labeled.then(|| label_for_delta7(altitude_7d_decay)),
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FluxProvenance;
    use chrono::{Duration, TimeZone, Utc};

    fn state(day: i64, altitude_km: f64) -> OrbitalState {
        OrbitalState {
            epoch: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            altitude_km,
            eccentricity: 0.001,
            mean_motion: 15.5,
            inclination_deg: 53.0,
        }
    }

    fn solar(day: i64, f107: f64) -> SolarCondition {
        SolarCondition {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
            f107,
            kp: 2.0,
            provenance: FluxProvenance::Observed,
        }
    }

    #[test]
    fn label_bins_are_fixed() {
        assert_eq!(label_for_delta7(-40.0), RiskLevel::High);
        assert_eq!(label_for_delta7(-35.0), RiskLevel::High);
        assert_eq!(label_for_delta7(-34.9), RiskLevel::Medium);
        assert_eq!(label_for_delta7(-7.0), RiskLevel::Medium);
        assert_eq!(label_for_delta7(-6.9), RiskLevel::Low);
        assert_eq!(label_for_delta7(1.0), RiskLevel::Low);
    }

    #[test]
    fn leading_window_rows_dropped() {
        let states: Vec<_> = (0..10).map(|d| state(d, 400.0 - d as f64)).collect();
        let solar: Vec<_> = (0..10).map(|d| solar(d, 150.0)).collect();
        let rows = derive_features(states, &solar, true);
        // First 7 records have no 7-day delta
        assert_eq!(rows.len(), 3);
        assert!((rows[0].altitude_7d_decay - -7.0).abs() < 1e-9);
    }

    #[test]
    fn rows_outside_join_tolerance_dropped() {
        let states: Vec<_> = (0..10).map(|d| state(d, 400.0)).collect();
        // Solar data only covers the first 8 days
        let solar: Vec<_> = (0..8).map(|d| solar(d, 150.0)).collect();
        let rows = derive_features(states, &solar, false);
        // Records 7 and 8 survive (day 8 is within 1 day of day 7 data);
        // day 9 has no solar match inside tolerance.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn unsorted_input_is_sorted_before_lagging() {
        let mut states: Vec<_> = (0..9).map(|d| state(d, 400.0 - d as f64)).collect();
        states.reverse();
        let solar: Vec<_> = (0..9).map(|d| solar(d, 150.0)).collect();
        let rows = derive_features(states, &solar, true);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].altitude_7d_decay < 0.0);
    }

    #[test]
    fn drag_vulnerability_matches_formula() {
        let v = drag_vulnerability(400.0, 0.01, 150.0);
        assert!((v - (1.0 * 1.1 * 1.5)).abs() < 1e-12);
    }
}
