use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::hybrid::HybridPredictor;
use crate::physics::{round2, OrbitalState};
use crate::sources::{current_solar_or_estimated, ElementSource, SolarCondition};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchQuery {
    /// Comma-separated NORAD catalog numbers.
    pub ids: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchEntry {
    pub norad_id: u32,
    pub altitude_km: f64,
    pub risk_score: u8,
    pub decay_7d_km: f64,
    pub decay_30d_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
    pub requested: usize,
    pub resolved: usize,
}

/// Parse the comma-separated id list, dropping tokens that are not
/// valid catalog numbers.
pub fn parse_ids(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            match token.parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    log::warn!("ignoring malformed batch id {token:?}");
                    None
                }
            }
        })
        .collect()
}

/// One batch row from an already-resolved state. Pure, shared with the
/// CLI batch command.
pub fn batch_entry(
    predictor: &HybridPredictor,
    norad_id: u32,
    state: &OrbitalState,
    solar: &SolarCondition,
) -> BatchEntry {
    let result = predictor.predict(state, solar, &[7, 30]);
    let decay_7d_km = result
        .predictions
        .get("7d")
        .map(|p| p.change_km)
        .unwrap_or(0.0);
    let decay_30d_km = result
        .predictions
        .get("30d")
        .map(|p| p.change_km)
        .unwrap_or(0.0);

    BatchEntry {
        norad_id,
        altitude_km: round2(state.altitude_km),
        risk_score: result.risk_score,
        decay_7d_km,
        decay_30d_km,
    }
}

#[utoipa::path(
    get,
    path = "/api/batch",
    tag = "satellite",
    params(("ids" = String, Query, description = "Comma-separated NORAD catalog numbers")),
    responses(
        (status = 200, description = "Best-effort risk scores; unresolvable ids are skipped", body = BatchResponse),
        (status = 400, description = "No valid ids supplied"),
        (status = 503, description = "Element source not configured")
    )
)]
pub async fn batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> ApiResult<impl IntoResponse> {
    let elements = state
        .elements
        .as_ref()
        .ok_or(ApiError::NotConfigured("element_source_not_configured"))?;

    let ids = parse_ids(&query.ids);
    if ids.is_empty() {
        return Err(ApiError::Validation("no valid ids supplied".into()));
    }

    let solar = current_solar_or_estimated(state.solar.as_ref()).await;

    // Per-item isolation: one satellite's failure never aborts the rest.
    let mut results = Vec::with_capacity(ids.len());
    for &norad_id in &ids {
        match elements.current(norad_id).await {
            Ok(Some(current)) => {
                results.push(batch_entry(&state.predictor, norad_id, &current, &solar));
            }
            Ok(None) => {
                log::warn!("NORAD {norad_id}: no current element set, skipping");
            }
            Err(e) => {
                log::warn!("NORAD {norad_id}: element fetch failed ({e}), skipping");
            }
        }
    }

    Ok((
        StatusCode::OK,
        Json(BatchResponse {
            requested: ids.len(),
            resolved: results.len(),
            results,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::AtmosphereParams;
    use crate::sources::FluxProvenance;
    use chrono::Utc;

    #[test]
    fn id_parsing_is_lenient() {
        assert_eq!(parse_ids("25544,44713, 44714"), vec![25544, 44713, 44714]);
        assert_eq!(parse_ids("25544,,junk,44713"), vec![25544, 44713]);
        assert!(parse_ids("").is_empty());
    }

    #[test]
    fn batch_entry_carries_both_horizons() {
        let predictor = HybridPredictor::new(AtmosphereParams::default(), None);
        let state = OrbitalState {
            epoch: Utc::now(),
            altitude_km: 320.0,
            eccentricity: 0.001,
            mean_motion: 15.9,
            inclination_deg: 53.0,
        };
        let solar = SolarCondition {
            timestamp: Utc::now(),
            f107: 150.0,
            kp: 2.0,
            provenance: FluxProvenance::Observed,
        };
        let entry = batch_entry(&predictor, 99999, &state, &solar);
        assert_eq!(entry.norad_id, 99999);
        assert_eq!(entry.risk_score, 70); // fallback tier for 320 km
        assert!(entry.decay_7d_km < 0.0);
        assert!(entry.decay_30d_km < entry.decay_7d_km);
    }
}
