use thiserror::Error;

use crate::model::ModelError;
use crate::physics::PhysicsError;
use crate::sources::SourceError;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("insufficient training data: {got} rows collected, need at least {need}")]
    InsufficientData { got: usize, need: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("metrics report I/O error: {0}")]
    Report(#[from] std::io::Error),
}
