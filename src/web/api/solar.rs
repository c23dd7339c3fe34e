use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::sources::{current_solar_or_estimated, SolarCondition};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/solar",
    tag = "solar",
    responses((
        status = 200,
        description = "Current solar and geomagnetic conditions; estimated values when the upstream feed is unavailable",
        body = SolarCondition
    ))
)]
pub async fn solar(State(state): State<AppState>) -> impl IntoResponse {
    let conditions = current_solar_or_estimated(state.solar.as_ref()).await;
    (StatusCode::OK, Json(conditions))
}
