use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model bundle I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model bundle format error: {0}")]
    Format(#[from] serde_json::Error),
    #[error("training set too small: {got} rows, need at least {need}")]
    InsufficientTrainingData { got: usize, need: usize },
    #[error("feature vector has {got} values, classifier expects {expected}")]
    FeatureWidth { got: usize, expected: usize },
}
