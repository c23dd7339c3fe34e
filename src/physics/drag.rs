/// Base ballistic coefficient (m²/kg), typical for small satellites.
const BASE_BC: f64 = 0.02;

/// Altitude- and eccentricity-dependent ballistic factor.
///
/// Eccentric orbits spend more time sweeping dense air near perigee,
/// so effective drag exposure rises with eccentricity. No bounds are
/// enforced: outside the 150–550 km training regime the value is
/// extrapolated and callers treat the result as low-confidence.
pub fn drag_coefficient(altitude_km: f64, eccentricity: f64) -> f64 {
    let ecc_factor = 1.0 + 2.0 * eccentricity;
    let alt_factor = ((400.0 - altitude_km) / 100.0).exp();
    BASE_BC * ecc_factor * alt_factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_value_at_reference_altitude_circular_orbit() {
        assert!((drag_coefficient(400.0, 0.0) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn lower_altitude_means_more_drag() {
        assert!(drag_coefficient(300.0, 0.001) > drag_coefficient(400.0, 0.001));
        assert!(drag_coefficient(400.0, 0.001) > drag_coefficient(500.0, 0.001));
    }

    #[test]
    fn eccentricity_raises_exposure() {
        assert!(drag_coefficient(400.0, 0.1) > drag_coefficient(400.0, 0.0));
    }
}
