use utoipa::OpenApi;

use super::api::batch::{BatchEntry, BatchQuery, BatchResponse};
use super::api::error::ErrorResponse;
use super::api::health::HealthResponse;
use super::api::predict::PredictRequest;
use super::api::satellite::{HistoryPoint, SatelliteResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::health::health,
        super::api::predict::predict,
        super::api::satellite::get_satellite,
        super::api::batch::batch,
        super::api::solar::solar,
    ),
    components(
        schemas(
            HealthResponse,
            PredictRequest,
            SatelliteResponse,
            HistoryPoint,
            BatchQuery,
            BatchEntry,
            BatchResponse,
            ErrorResponse,
            crate::hybrid::HybridResult,
            crate::hybrid::DecayPrediction,
            crate::physics::OrbitalState,
            crate::sources::SolarCondition,
            crate::sources::FluxProvenance,
            crate::features::RiskLevel,
        )
    ),
    info(
        title = "Decaywatch API",
        description = "Hybrid physics + ML orbital decay predictions",
        version = "0.1.0"
    ),
    tags(
        (name = "predict", description = "Decay predictions"),
        (name = "satellite", description = "Per-satellite queries"),
        (name = "solar", description = "Solar and geomagnetic conditions"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
