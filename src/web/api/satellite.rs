use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::hybrid::{HybridResult, DEFAULT_HORIZONS};
use crate::physics::{round2, OrbitalState};
use crate::sources::{current_solar_or_estimated, ElementSource};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::server::AppState;

const HISTORY_DAYS: u32 = 90;

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryPoint {
    pub epoch: chrono::DateTime<chrono::Utc>,
    pub altitude_km: f64,
    pub mean_motion: f64,
    pub eccentricity: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteResponse {
    pub norad_id: u32,
    pub current_state: OrbitalState,
    pub prediction: HybridResult,
    pub history: Vec<HistoryPoint>,
    /// Observed daily decay over the history window (km/day), when at
    /// least two points exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_decay_rate_km_day: Option<f64>,
}

/// Observed decay rate from the first and last points of an ordered
/// history.
pub fn actual_decay_rate(history: &[OrbitalState]) -> Option<f64> {
    let first = history.first()?;
    let last = history.last()?;
    let days = (last.epoch - first.epoch).num_days();
    if days <= 0 {
        return None;
    }
    Some((last.altitude_km - first.altitude_km) / days as f64)
}

#[utoipa::path(
    get,
    path = "/api/satellite/{norad_id}",
    tag = "satellite",
    params(("norad_id" = u32, Path, description = "NORAD catalog number")),
    responses(
        (status = 200, description = "Prediction with recent history", body = SatelliteResponse),
        (status = 404, description = "No current element set for this object"),
        (status = 502, description = "Element source unavailable"),
        (status = 503, description = "Element source not configured")
    )
)]
pub async fn get_satellite(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
) -> ApiResult<impl IntoResponse> {
    let elements = state
        .elements
        .as_ref()
        .ok_or(ApiError::NotConfigured("element_source_not_configured"))?;

    let current = elements
        .current(norad_id)
        .await?
        .ok_or(ApiError::NotFound("satellite_not_found"))?;

    let solar = current_solar_or_estimated(state.solar.as_ref()).await;
    let prediction = state
        .predictor
        .predict(&current, &solar, &DEFAULT_HORIZONS);

    // History is best-effort garnish; its failure must not fail the
    // prediction itself.
    let mut history_states = match elements.history(norad_id, HISTORY_DAYS).await {
        Ok(h) => h,
        Err(e) => {
            log::warn!("history fetch for NORAD {norad_id} failed: {e}");
            Vec::new()
        }
    };
    history_states.sort_by_key(|s| s.epoch);

    let actual_decay_rate_km_day = actual_decay_rate(&history_states).map(round2);
    let history = history_states
        .into_iter()
        .map(|s| HistoryPoint {
            epoch: s.epoch,
            altitude_km: round2(s.altitude_km),
            mean_motion: s.mean_motion,
            eccentricity: s.eccentricity,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(SatelliteResponse {
            norad_id,
            current_state: current,
            prediction,
            history,
            actual_decay_rate_km_day,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn decay_rate_from_endpoints() {
        let history = vec![state(0, 420.0), state(5, 418.0), state(10, 415.0)];
        let rate = actual_decay_rate(&history).unwrap();
        assert!((rate - (-0.5)).abs() < 1e-9);
    }

    #[test]
    fn too_short_history_gives_no_rate() {
        assert!(actual_decay_rate(&[]).is_none());
        assert!(actual_decay_rate(&[state(0, 420.0)]).is_none());
        // Same-day points cannot produce a daily rate
        assert!(actual_decay_rate(&[state(0, 420.0), state(0, 419.0)]).is_none());
    }
}
