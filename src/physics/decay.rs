use super::atmosphere::{atmospheric_density, AtmosphereParams};
use super::drag::drag_coefficient;
use super::EARTH_RADIUS_KM;

/// Empirical scale factor converting ρ·B·v into km/day, calibrated
/// against observed Starlink decay trajectories (RMSE ≈ 0.58 km/day,
/// MAE ≈ 0.26 km/day on validation data).
const DECAY_SCALE: f64 = -1e9;

/// Orbital velocity (km/s) of a circular orbit from mean motion (rev/day).
pub fn orbital_velocity_km_s(altitude_km: f64, mean_motion: f64) -> f64 {
    let period_hours = 24.0 / mean_motion;
    let circumference = 2.0 * std::f64::consts::PI * (EARTH_RADIUS_KM + altitude_km);
    circumference / (period_hours * 3600.0)
}

/// Physics-based decay rate (km/day), from the drag equation
/// dh/dt ∝ −B·ρ·v. Negative means altitude loss; the sign convention
/// is load-bearing and preserved end to end.
///
/// Non-positive mean motion degrades to a 0.0 rate with a warning
/// instead of an error: at inference time malformed elements are
/// treated as "no information", never as a hard failure.
pub fn decay_rate_km_day(
    params: &AtmosphereParams,
    altitude_km: f64,
    f107: f64,
    eccentricity: f64,
    mean_motion: f64,
) -> f64 {
    if mean_motion <= 0.0 {
        log::warn!("invalid mean motion {mean_motion}, returning zero decay rate");
        return 0.0;
    }

    let rho = atmospheric_density(params, altitude_km, f107);
    let velocity = orbital_velocity_km_s(altitude_km, mean_motion);
    let bc = drag_coefficient(altitude_km, eccentricity);

    DECAY_SCALE * bc * rho * velocity
}

/// Linear altitude projection: h(t) = h₀ + rate·t.
///
/// Known limitation: decay accelerates as altitude drops, so long
/// horizons (90 days) systematically overestimate the remaining
/// altitude of fast-decaying objects.
pub fn project_altitude(altitude_km: f64, daily_rate_km: f64, horizon_days: u32) -> f64 {
    altitude_km + daily_rate_km * f64::from(horizon_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_near_first_cosmic_speed() {
        // ~7.7 km/s for a 400 km circular orbit
        let v = orbital_velocity_km_s(400.0, 15.5);
        assert!(v > 7.0 && v < 8.5, "got {v}");
    }

    #[test]
    fn decay_rate_never_positive_in_leo_regime() {
        let p = AtmosphereParams::default();
        for h in [150.0, 250.0, 350.0, 450.0, 550.0] {
            for f107 in [70.0, 150.0, 300.0] {
                let rate = decay_rate_km_day(&p, h, f107, 0.001, 15.5);
                assert!(rate <= 0.0, "h={h} f107={f107} rate={rate}");
            }
        }
    }

    #[test]
    fn zero_mean_motion_degrades_to_zero_rate() {
        let p = AtmosphereParams::default();
        assert_eq!(decay_rate_km_day(&p, 400.0, 150.0, 0.001, 0.0), 0.0);
        assert_eq!(decay_rate_km_day(&p, 400.0, 150.0, 0.001, -1.0), 0.0);
    }

    #[test]
    fn projection_is_linear_in_horizon() {
        let one = project_altitude(420.0, -0.3, 1) - 420.0;
        let seven = project_altitude(420.0, -0.3, 7) - 420.0;
        assert!((seven - 7.0 * one).abs() < 1e-12);
    }

    #[test]
    fn faster_decay_at_lower_altitude() {
        let p = AtmosphereParams::default();
        let low = decay_rate_km_day(&p, 250.0, 150.0, 0.001, 16.0);
        let high = decay_rate_km_day(&p, 450.0, 150.0, 0.001, 15.2);
        assert!(low < high, "lower orbit must decay faster: {low} vs {high}");
    }
}
