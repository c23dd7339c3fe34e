use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::hybrid::HybridPredictor;
use crate::model::ModelBundle;
use crate::sources::{NoaaSource, SpaceTrackSource};

use super::api::{batch, health, predict, satellite, solar};
use super::api_doc::ApiDoc;
use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<HybridPredictor>,
    /// Absent when Space-Track credentials are not configured; the
    /// per-satellite endpoints answer 503 in that case while
    /// /api/predict keeps working on caller-supplied state.
    pub elements: Option<Arc<SpaceTrackSource>>,
    pub solar: Arc<NoaaSource>,
}

pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.web.bind.clone();

    // The bundle is loaded whole before the listener opens; a partial
    // or malformed bundle aborts startup.
    let bundle = match &config.model.bundle_path {
        Some(path) => {
            let bundle = ModelBundle::load(path)?;
            log::info!(
                "model bundle loaded from {} (classifier: {})",
                path.display(),
                bundle.classifier.is_some()
            );
            bundle
        }
        None => {
            log::warn!("no model bundle configured, serving physics-only predictions");
            ModelBundle::physics_only()
        }
    };
    let predictor = Arc::new(HybridPredictor::from_bundle(bundle));

    let elements = match SpaceTrackSource::from_env(config.sources.spacetrack_url.clone())? {
        Some(source) => Some(Arc::new(source)),
        None => {
            log::warn!("SPACETRACK_USERNAME/PASSWORD not set, satellite lookups disabled");
            None
        }
    };
    let solar = Arc::new(NoaaSource::new(config.sources.noaa_url.clone())?);

    let state = AppState {
        predictor,
        elements,
        solar,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/predict", post(predict::predict))
        .route("/api/satellite/{norad_id}", get(satellite::get_satellite))
        .route("/api/batch", get(batch::batch))
        .route("/api/solar", get(solar::solar))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
