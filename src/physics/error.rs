use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("invalid orbital element: mean motion must be positive, got {mean_motion}")]
    InvalidOrbitalElement { mean_motion: f64 },
}
