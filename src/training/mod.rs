mod error;
mod harness;
mod metrics;

pub use error::TrainError;
pub use harness::{
    collect_dataset, train_and_save, validate_physics, PhysicsValidation, TrainOptions,
    TrainReport, DEFAULT_TRAINING_SATELLITES,
};
pub use metrics::{ClassifierMetrics, RegressionMetrics};
