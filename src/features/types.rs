use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Width of the classifier feature vector.
pub const FEATURE_COUNT: usize = 8;

/// Discrete risk category produced by labeling and classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn class_index(self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    pub fn from_class_index(index: usize) -> RiskLevel {
        match index {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// One engineered training/inference row: an orbital snapshot joined
/// with its nearest solar snapshot plus the derived features.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub epoch: DateTime<Utc>,
    pub altitude_km: f64,
    pub eccentricity: f64,
    pub mean_motion: f64,
    pub altitude_7d_decay: f64,
    pub altitude_30d_decay: f64,
    pub f107_current: f64,
    pub f107_7d_avg: f64,
    pub drag_vulnerability: f64,
    /// Present only on labeled training rows.
    pub label: Option<RiskLevel>,
}

impl FeatureRow {
    /// Fixed feature ordering shared by training and inference.
    pub fn vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.altitude_km,
            self.altitude_7d_decay,
            self.altitude_30d_decay,
            self.f107_current,
            self.f107_7d_avg,
            self.drag_vulnerability,
            self.mean_motion,
            self.eccentricity,
        ]
    }
}
