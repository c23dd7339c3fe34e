//! End-to-end scenarios over the full hybrid path: normalized state in,
//! physics rate, projections, risk and confidence out.

#![cfg(test)]

use chrono::Utc;

use super::{HybridPredictor, DEFAULT_HORIZONS};
use crate::features::RiskLevel;
use crate::model::{GbtClassifier, GbtConfig};
use crate::physics::{AtmosphereParams, OrbitalState};
use crate::sources::{FluxProvenance, SolarCondition};

fn orbital(altitude_km: f64, eccentricity: f64, mean_motion: f64) -> OrbitalState {
    OrbitalState {
        epoch: Utc::now(),
        altitude_km,
        eccentricity,
        mean_motion,
        inclination_deg: 53.0,
    }
}

fn solar(f107: f64) -> SolarCondition {
    SolarCondition {
        timestamp: Utc::now(),
        f107,
        kp: 2.0,
        provenance: FluxProvenance::Observed,
    }
}

#[test]
fn nominal_leo_object_decays_across_all_horizons() {
    let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
    let state = orbital(420.0, 0.001, 15.3);
    let result = predictor.predict(&state, &solar(150.0), &[7, 30, 90]);

    assert_eq!(result.predictions.len(), 3);
    let p7 = &result.predictions["7d"];
    let p30 = &result.predictions["30d"];
    let p90 = &result.predictions["90d"];

    assert!(p7.daily_rate_km < 0.0, "nominal LEO must decay");
    assert!(p7.change_km < 0.0);

    // Linear projection: change scales exactly with the horizon ratio
    assert!((p30.change_km - p7.change_km * 30.0 / 7.0).abs() < 1e-9);
    assert!((p90.change_km - p7.change_km * 90.0 / 7.0).abs() < 1e-9);

    // 420 km sits in the 350-450 confidence band
    assert_eq!(result.confidence, 0.70);
    assert_eq!(result.method, "physics_based");
}

#[test]
fn malformed_mean_motion_degrades_to_flat_zero_forecast() {
    let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
    let state = orbital(400.0, 0.001, 0.0);
    let result = predictor.predict(&state, &solar(150.0), &DEFAULT_HORIZONS);

    for prediction in result.predictions.values() {
        assert_eq!(prediction.daily_rate_km, 0.0);
        assert_eq!(prediction.change_km, 0.0);
        assert_eq!(prediction.altitude_km, 400.0);
    }
}

#[test]
fn low_altitude_without_classifier_scores_maximum_fallback_risk() {
    let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
    let state = orbital(250.0, 0.001, 16.2);
    let result = predictor.predict(&state, &solar(150.0), &DEFAULT_HORIZONS);

    assert_eq!(result.risk_score, 100);
    assert!(result.risk_probabilities.is_none());
    assert_eq!(result.method, "physics_based");
    assert_eq!(result.confidence, 0.85);
}

#[test]
fn classifier_branch_emits_coarse_scores_with_probabilities() {
    // Train a tiny classifier whose decision is dominated by the
    // 7-day-decay feature, mirroring the real feature layout.
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..40 {
        let jitter = (i % 4) as f64 * 0.3;
        // [altitude, d7, d30, f107, f107_avg, drag_vuln, mm, ecc]
        features.push(vec![450.0, -1.0 - jitter, -4.0, 150.0, 150.0, 1.0, 15.2, 0.001]);
        labels.push(RiskLevel::Low);
        features.push(vec![350.0, -15.0 - jitter, -60.0, 150.0, 150.0, 2.0, 15.7, 0.001]);
        labels.push(RiskLevel::Medium);
        features.push(vec![250.0, -45.0 - jitter, -180.0, 150.0, 150.0, 3.5, 16.2, 0.001]);
        labels.push(RiskLevel::High);
    }
    let classifier = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();
    let predictor = HybridPredictor::new(AtmosphereParams::default(), Some(classifier));

    let result = predictor.predict(&orbital(250.0, 0.001, 16.2), &solar(150.0), &[7]);
    assert!(
        matches!(result.risk_score, 0 | 50 | 100),
        "classifier branch is coarse by policy, got {}",
        result.risk_score
    );
    let proba = result.risk_probabilities.expect("classifier probabilities");
    assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn batch_style_iteration_isolates_failures() {
    // Mirrors the batch endpoint contract: resolvable states produce
    // entries, unresolvable ones are skipped, nothing aborts.
    let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
    let candidates: Vec<(u32, Option<OrbitalState>)> = vec![
        (25544, Some(orbital(420.0, 0.001, 15.5))),
        (99999, None), // already decayed, no current element set
        (44713, Some(orbital(300.0, 0.002, 15.9))),
    ];

    let sol = solar(150.0);
    let results: Vec<_> = candidates
        .iter()
        .filter_map(|(id, state)| {
            state
                .as_ref()
                .map(|s| crate::web::api::batch::batch_entry(&predictor, *id, s, &sol))
        })
        .collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].norad_id, 25544);
    assert_eq!(results[1].norad_id, 44713);
}
