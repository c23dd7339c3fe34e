use serde::{Deserialize, Serialize};

/// The three physics constants persisted alongside the trained
/// classifier in the model bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtmosphereParams {
    /// Atmospheric scale height (km), controls the exponential falloff.
    pub scale_height_km: f64,
    /// Reference density at `h_ref_km` (kg/m³).
    pub rho_ref: f64,
    /// Reference altitude (km).
    pub h_ref_km: f64,
}

impl Default for AtmosphereParams {
    fn default() -> Self {
        AtmosphereParams {
            scale_height_km: 50.0,
            rho_ref: 5e-12,
            h_ref_km: 400.0,
        }
    }
}

/// Exponential atmospheric density (kg/m³) with a linear solar-heating
/// correction normalized at 150 sfu.
///
/// Single scale height, tuned for the 150–550 km LEO regime: the model
/// prioritizes monotonic qualitative behavior over absolute accuracy.
/// The exponential form keeps density strictly positive for any finite
/// altitude.
pub fn atmospheric_density(params: &AtmosphereParams, altitude_km: f64, f107: f64) -> f64 {
    let f107_factor = 1.0 + 0.003 * (f107 - 150.0);
    params.rho_ref * f107_factor * ((params.h_ref_km - altitude_km) / params.scale_height_km).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_at_reference_altitude_matches_reference() {
        let p = AtmosphereParams::default();
        let rho = atmospheric_density(&p, 400.0, 150.0);
        assert!((rho - 5e-12).abs() < 1e-24);
    }

    #[test]
    fn density_strictly_decreasing_in_altitude() {
        let p = AtmosphereParams::default();
        let mut prev = atmospheric_density(&p, 150.0, 150.0);
        let mut h = 175.0;
        while h <= 550.0 {
            let rho = atmospheric_density(&p, h, 150.0);
            assert!(rho < prev, "density must fall with altitude (h={h})");
            prev = rho;
            h += 25.0;
        }
    }

    #[test]
    fn density_strictly_increasing_in_solar_flux() {
        let p = AtmosphereParams::default();
        let mut prev = atmospheric_density(&p, 400.0, 70.0);
        let mut f107 = 90.0;
        while f107 <= 300.0 {
            let rho = atmospheric_density(&p, 400.0, f107);
            assert!(rho > prev, "density must rise with f10.7 (f107={f107})");
            prev = rho;
            f107 += 20.0;
        }
    }

    #[test]
    fn density_always_positive() {
        let p = AtmosphereParams::default();
        for h in [150.0, 300.0, 550.0, 1000.0] {
            for f107 in [70.0, 150.0, 300.0] {
                assert!(atmospheric_density(&p, h, f107) > 0.0);
            }
        }
    }
}
