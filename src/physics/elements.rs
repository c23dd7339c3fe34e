use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PhysicsError;
use super::{EARTH_RADIUS_KM, GM_EARTH};

/// Normalized orbital state, built once at the collaborator boundary.
///
/// Altitude is always computed from mean motion, never taken from an
/// upstream payload field.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrbitalState {
    pub epoch: DateTime<Utc>,
    pub altitude_km: f64,
    pub eccentricity: f64,
    pub mean_motion: f64,
    pub inclination_deg: f64,
}

impl OrbitalState {
    /// Build a state from raw elements, deriving altitude via Kepler's
    /// third law. Fails on non-positive mean motion; at training time
    /// this is a hard error so malformed elements cannot poison labels.
    pub fn from_elements(
        epoch: DateTime<Utc>,
        mean_motion: f64,
        eccentricity: f64,
        inclination_deg: f64,
    ) -> Result<Self, PhysicsError> {
        let altitude_km = altitude_from_mean_motion(mean_motion)?;
        Ok(OrbitalState {
            epoch,
            altitude_km,
            eccentricity,
            mean_motion,
            inclination_deg,
        })
    }
}

/// Altitude (km above mean Earth radius) from mean motion (rev/day).
///
/// period = 86400 / mm seconds, a = (GM·T²/4π²)^(1/3), h = a − R⊕.
pub fn altitude_from_mean_motion(mean_motion: f64) -> Result<f64, PhysicsError> {
    if mean_motion <= 0.0 {
        return Err(PhysicsError::InvalidOrbitalElement { mean_motion });
    }
    let period_s = 86400.0 / mean_motion;
    let semi_major_axis =
        (GM_EARTH * period_s * period_s / (4.0 * std::f64::consts::PI.powi(2))).cbrt();
    Ok(semi_major_axis - EARTH_RADIUS_KM)
}

/// Round to 2 decimal places for display. Internal math keeps full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
