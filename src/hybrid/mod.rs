mod scenarios;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::drag_vulnerability;
use crate::model::{class_to_score, fallback_risk_score, GbtClassifier, ModelBundle};
use crate::physics::{decay_rate_km_day, project_altitude, round2, AtmosphereParams, OrbitalState};
use crate::sources::SolarCondition;

/// Horizons used when a query does not name its own.
pub const DEFAULT_HORIZONS: [u32; 3] = [7, 30, 90];

/// Altitude forecast at one horizon.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DecayPrediction {
    pub horizon_days: u32,
    pub altitude_km: f64,
    pub change_km: f64,
    pub daily_rate_km: f64,
}

/// One hybrid inference result: physics forecast per horizon plus the
/// learned (or fallback) risk category, built fresh per call.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HybridResult {
    /// Keyed "7d", "30d", ... in horizon order.
    pub predictions: BTreeMap<String, DecayPrediction>,
    pub risk_score: u8,
    /// Classifier class probabilities [low, medium, high]; absent on
    /// the fallback path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_probabilities: Option<Vec<f64>>,
    pub confidence: f64,
    pub method: &'static str,
}

/// Hybrid physics + ML predictor. Constructed once with its immutable
/// configuration and injected where needed; prediction is a pure
/// function of the inputs and the loaded bundle.
pub struct HybridPredictor {
    atmosphere: AtmosphereParams,
    classifier: Option<GbtClassifier>,
}

impl HybridPredictor {
    pub fn new(atmosphere: AtmosphereParams, classifier: Option<GbtClassifier>) -> Self {
        HybridPredictor {
            atmosphere,
            classifier,
        }
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        HybridPredictor {
            atmosphere: bundle.atmosphere,
            classifier: bundle.classifier,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Physics decay rate for the given state under the given solar
    /// conditions (km/day, negative = altitude loss).
    pub fn daily_rate(&self, state: &OrbitalState, solar: &SolarCondition) -> f64 {
        decay_rate_km_day(
            &self.atmosphere,
            state.altitude_km,
            solar.f107,
            state.eccentricity,
            state.mean_motion,
        )
    }

    /// Run the full hybrid prediction.
    ///
    /// The classifier feature vector uses the physics-projected 7/30
    /// day deltas (rate·7, rate·30), not observed history: at inference
    /// time only the current state exists, so the ML stage is
    /// deliberately coupled to the physics stage.
    pub fn predict(
        &self,
        state: &OrbitalState,
        solar: &SolarCondition,
        horizons: &[u32],
    ) -> HybridResult {
        let daily_rate = self.daily_rate(state, solar);

        let mut predictions = BTreeMap::new();
        for &days in horizons {
            let future_altitude = project_altitude(state.altitude_km, daily_rate, days);
            predictions.insert(
                format!("{days}d"),
                DecayPrediction {
                    horizon_days: days,
                    altitude_km: round2(future_altitude),
                    // Full precision: the change must scale exactly
                    // with the horizon, so only the derived altitude
                    // gets display rounding.
                    change_km: daily_rate * f64::from(days),
                    daily_rate_km: daily_rate,
                },
            );
        }

        let (risk_score, risk_probabilities) = self.risk(state, solar, daily_rate);

        HybridResult {
            predictions,
            risk_score,
            risk_probabilities,
            confidence: confidence_for_altitude(state.altitude_km),
            method: "physics_based",
        }
    }

    fn risk(
        &self,
        state: &OrbitalState,
        solar: &SolarCondition,
        daily_rate: f64,
    ) -> (u8, Option<Vec<f64>>) {
        let Some(classifier) = &self.classifier else {
            return (fallback_risk_score(state.altitude_km), None);
        };

        let features = [
            state.altitude_km,
            daily_rate * 7.0,
            daily_rate * 30.0,
            solar.f107,
            solar.f107, // 7-day average approximated by the current value
            drag_vulnerability(state.altitude_km, state.eccentricity, solar.f107),
            state.mean_motion,
            state.eccentricity,
        ];

        match (
            classifier.predict(&features),
            classifier.predict_proba(&features),
        ) {
            (Ok(level), Ok(proba)) => (class_to_score(level), Some(proba.to_vec())),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("classifier inference failed ({e}), using threshold fallback");
                (fallback_risk_score(state.altitude_km), None)
            }
        }
    }
}

/// Confidence heuristic: the density model is best calibrated low in
/// the thermosphere, so confidence falls with altitude.
pub fn confidence_for_altitude(altitude_km: f64) -> f64 {
    if altitude_km < 350.0 {
        0.85
    } else if altitude_km < 450.0 {
        0.70
    } else {
        0.60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FluxProvenance;
    use chrono::Utc;

    fn state(altitude_source_mm: f64) -> OrbitalState {
        OrbitalState {
            epoch: Utc::now(),
            altitude_km: crate::physics::altitude_from_mean_motion(altitude_source_mm)
                .unwrap_or(0.0),
            eccentricity: 0.001,
            mean_motion: altitude_source_mm,
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
    fn rate_is_horizon_independent_and_change_scales_linearly() {
        let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
        let st = state(15.3);
        let sol = solar(150.0);

        let one = predictor.predict(&st, &sol, &[1]);
        let seven = predictor.predict(&st, &sol, &[7]);

        let c1 = one.predictions["1d"].change_km;
        let c7 = seven.predictions["7d"].change_km;
        assert_eq!(c7, 7.0 * c1, "c1={c1} c7={c7}");
        assert_eq!(
            one.predictions["1d"].daily_rate_km,
            seven.predictions["7d"].daily_rate_km
        );
    }

    #[test]
    fn change_scales_exactly_even_for_fast_decayers() {
        // Low altitude, fast decay: per-horizon rounding of the change
        // would visibly break the 7x relation here.
        let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
        let st = OrbitalState {
            epoch: Utc::now(),
            altitude_km: 253.0,
            eccentricity: 0.001,
            mean_motion: 16.2,
            inclination_deg: 53.0,
        };
        let sol = solar(150.0);

        let one = predictor.predict(&st, &sol, &[1]);
        let seven = predictor.predict(&st, &sol, &[7]);
        assert_eq!(
            seven.predictions["7d"].change_km,
            7.0 * one.predictions["1d"].change_km
        );
    }

    #[test]
    fn fallback_risk_when_no_classifier_loaded() {
        let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
        let mut st = state(16.2);
        st.altitude_km = 250.0;
        let result = predictor.predict(&st, &solar(150.0), &DEFAULT_HORIZONS);
        assert_eq!(result.risk_score, 100);
        assert!(result.risk_probabilities.is_none());
        assert_eq!(result.method, "physics_based");
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence_for_altitude(250.0), 0.85);
        assert_eq!(confidence_for_altitude(349.9), 0.85);
        assert_eq!(confidence_for_altitude(350.0), 0.70);
        assert_eq!(confidence_for_altitude(449.9), 0.70);
        assert_eq!(confidence_for_altitude(450.0), 0.60);
    }

    #[test]
    fn malformed_mean_motion_yields_flat_forecast() {
        let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
        let st = OrbitalState {
            epoch: Utc::now(),
            altitude_km: 400.0,
            eccentricity: 0.001,
            mean_motion: 0.0,
            inclination_deg: 53.0,
        };
        let result = predictor.predict(&st, &solar(150.0), &DEFAULT_HORIZONS);
        for p in result.predictions.values() {
            assert_eq!(p.daily_rate_km, 0.0);
            assert_eq!(p.change_km, 0.0);
            assert_eq!(p.altitude_km, 400.0);
        }
    }
}
