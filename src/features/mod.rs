mod pipeline;
mod types;

pub use pipeline::{derive_features, drag_vulnerability, label_for_delta7, nearest_solar};
pub use types::{FeatureRow, RiskLevel, FEATURE_COUNT};
