mod atmosphere;
mod decay;
mod drag;
mod elements;
mod error;

pub use atmosphere::{atmospheric_density, AtmosphereParams};
pub use decay::{decay_rate_km_day, orbital_velocity_km_s, project_altitude};
pub use drag::drag_coefficient;
pub use elements::{altitude_from_mean_motion, round2, OrbitalState};
pub use error::PhysicsError;

/// Standard gravitational parameter of Earth (km³/s²).
pub const GM_EARTH: f64 = 398600.4418;

/// Mean Earth radius (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;
