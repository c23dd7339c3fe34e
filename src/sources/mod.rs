mod noaa;
mod spacetrack;

pub use noaa::NoaaSource;
pub use spacetrack::SpaceTrackSource;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::OrbitalState;

/// F10.7 value assumed when the solar source is unavailable (sfu).
pub const ESTIMATED_F107: f64 = 120.0;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("upstream payload not understood: {0}")]
    Payload(String),
    #[error("authentication with element source failed")]
    Auth,
}

/// Provenance of a solar flux value. Estimated values are a policy
/// fallback, not an error condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FluxProvenance {
    Observed,
    Estimated,
}

/// Global solar/geomagnetic snapshot; one value applies to every
/// satellite at a given instant.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SolarCondition {
    pub timestamp: DateTime<Utc>,
    /// 10.7 cm radio flux (sfu), nominal range 70–300.
    pub f107: f64,
    /// Planetary geomagnetic index, 0–9.
    pub kp: f64,
    pub provenance: FluxProvenance,
}

impl SolarCondition {
    /// Fallback used when the solar source fails or returns stale data.
    pub fn estimated(timestamp: DateTime<Utc>) -> Self {
        SolarCondition {
            timestamp,
            f107: ESTIMATED_F107,
            kp: 2.0,
            provenance: FluxProvenance::Estimated,
        }
    }
}

/// Collaborator that resolves satellite identifiers to orbital states.
#[async_trait::async_trait]
pub trait ElementSource {
    /// Latest state for a satellite, or `None` when the object has no
    /// current element set (e.g. already decayed).
    async fn current(&self, norad_id: u32) -> Result<Option<OrbitalState>, SourceError>;

    /// Historical states over the trailing window, oldest first.
    async fn history(&self, norad_id: u32, days_back: u32)
        -> Result<Vec<OrbitalState>, SourceError>;
}

/// Collaborator providing solar/geomagnetic conditions.
#[async_trait::async_trait]
pub trait SolarSource {
    async fn current(&self) -> Result<SolarCondition, SourceError>;

    /// Conditions over a date range. Only month-granularity averages
    /// may be available; implementations expand them piecewise-constant
    /// per day.
    async fn historical(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SolarCondition>, SourceError>;
}

/// Current conditions with the estimated-value fallback applied.
pub async fn current_solar_or_estimated<S: SolarSource>(source: &S) -> SolarCondition {
    match source.current().await {
        Ok(cond) => cond,
        Err(e) => {
            log::warn!("solar source unavailable ({e}), using estimated f10.7");
            SolarCondition::estimated(Utc::now())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownSource;

    #[async_trait::async_trait]
    impl SolarSource for DownSource {
        async fn current(&self) -> Result<SolarCondition, SourceError> {
            Err(SourceError::Payload("feed offline".into()))
        }

        async fn historical(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<SolarCondition>, SourceError> {
            Err(SourceError::Payload("feed offline".into()))
        }
    }

    #[tokio::test]
    async fn solar_queries_degrade_to_estimated_conditions() {
        let cond = current_solar_or_estimated(&DownSource).await;
        assert_eq!(cond.provenance, FluxProvenance::Estimated);
        assert_eq!(cond.f107, ESTIMATED_F107);
        assert_eq!(cond.kp, 2.0);
    }
}
