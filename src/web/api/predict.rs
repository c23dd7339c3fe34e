use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::hybrid::DEFAULT_HORIZONS;
use crate::physics::{altitude_from_mean_motion, OrbitalState};
use crate::sources::{current_solar_or_estimated, FluxProvenance, SolarCondition};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::server::AppState;

/// Defaults applied at this boundary when the caller omits elements.
const DEFAULT_ECCENTRICITY: f64 = 0.001;
const DEFAULT_MEAN_MOTION: f64 = 15.5;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    #[serde(default)]
    pub epoch: Option<DateTime<Utc>>,
    /// Accepted for the degenerate case where mean motion is unusable;
    /// otherwise altitude is always recomputed from mean motion.
    #[serde(default)]
    pub altitude_km: Option<f64>,
    #[serde(default)]
    pub mean_motion: Option<f64>,
    #[serde(default)]
    pub eccentricity: Option<f64>,
    #[serde(default)]
    pub inclination_deg: Option<f64>,
    /// Explicit solar flux; fetched from the solar source when absent.
    #[serde(default)]
    pub f107: Option<f64>,
    #[serde(default)]
    pub horizons: Option<Vec<u32>>,
}

/// Build the normalized orbital state once, at the boundary. The core
/// never performs key-fallback or defaulting logic itself.
pub fn normalize_state(request: &PredictRequest) -> Result<OrbitalState, ApiError> {
    let mean_motion = request.mean_motion.unwrap_or(DEFAULT_MEAN_MOTION);
    let eccentricity = request.eccentricity.unwrap_or(DEFAULT_ECCENTRICITY);

    let altitude_km = match altitude_from_mean_motion(mean_motion) {
        Ok(h) => h,
        // Malformed mean motion degrades to a zero-rate prediction at
        // query time, but only when the caller supplied an altitude to
        // anchor the flat forecast.
        Err(_) => request.altitude_km.ok_or_else(|| {
            ApiError::Validation(
                "mean_motion must be positive, or altitude_km must be provided".into(),
            )
        })?,
    };

    Ok(OrbitalState {
        epoch: request.epoch.unwrap_or_else(Utc::now),
        altitude_km,
        eccentricity,
        mean_motion,
        inclination_deg: request.inclination_deg.unwrap_or(0.0),
    })
}

fn validate_horizons(horizons: &[u32]) -> Result<(), ApiError> {
    if horizons.is_empty() {
        return Err(ApiError::Validation("horizons must not be empty".into()));
    }
    if horizons.iter().any(|&d| d == 0 || d > 3650) {
        return Err(ApiError::Validation(
            "horizons must be between 1 and 3650 days".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/predict",
    tag = "predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Hybrid decay prediction", body = crate::hybrid::HybridResult),
        (status = 400, description = "Invalid parameters")
    )
)]
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<impl IntoResponse> {
    let horizons = request
        .horizons
        .clone()
        .unwrap_or_else(|| DEFAULT_HORIZONS.to_vec());
    validate_horizons(&horizons)?;

    let orbital_state = normalize_state(&request)?;

    let solar = match request.f107 {
        Some(f107) => SolarCondition {
            timestamp: Utc::now(),
            f107,
            kp: 2.0,
            provenance: FluxProvenance::Observed,
        },
        None => current_solar_or_estimated(state.solar.as_ref()).await,
    };

    let result = state.predictor.predict(&orbital_state, &solar, &horizons);
    Ok((StatusCode::OK, Json(result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictRequest {
        PredictRequest {
            epoch: None,
            altitude_km: None,
            mean_motion: None,
            eccentricity: None,
            inclination_deg: None,
            f107: None,
            horizons: None,
        }
    }

    #[test]
    fn defaults_applied_when_elements_absent() {
        let state = normalize_state(&request()).unwrap();
        assert_eq!(state.mean_motion, 15.5);
        assert_eq!(state.eccentricity, 0.001);
        assert!(state.altitude_km > 350.0 && state.altitude_km < 450.0);
    }

    #[test]
    fn altitude_always_recomputed_from_mean_motion() {
        let mut req = request();
        req.mean_motion = Some(15.5);
        req.altitude_km = Some(9999.0); // ignored in favor of Kepler
        let state = normalize_state(&req).unwrap();
        assert!(state.altitude_km < 500.0);
    }

    #[test]
    fn zero_mean_motion_needs_an_anchor_altitude() {
        let mut req = request();
        req.mean_motion = Some(0.0);
        assert!(normalize_state(&req).is_err());

        req.altitude_km = Some(400.0);
        let state = normalize_state(&req).unwrap();
        assert_eq!(state.altitude_km, 400.0);
        assert_eq!(state.mean_motion, 0.0);
    }

    #[test]
    fn horizon_validation() {
        assert!(validate_horizons(&[7, 30, 90]).is_ok());
        assert!(validate_horizons(&[]).is_err());
        assert!(validate_horizons(&[0]).is_err());
        assert!(validate_horizons(&[4000]).is_err());
    }
}
