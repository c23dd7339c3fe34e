mod bundle;
mod error;
mod gbt;

pub use bundle::ModelBundle;
pub use error::ModelError;
pub use gbt::{GbtClassifier, GbtConfig};

use crate::features::RiskLevel;

/// Rescale a discrete risk class to the 0–100 score. Only {0, 50, 100}
/// are producible on the classifier branch; the score is coarse by
/// policy, not a continuous probability.
pub fn class_to_score(level: RiskLevel) -> u8 {
    (level.class_index() as u8) * 50
}

/// Altitude-threshold risk score used when no classifier is loaded.
/// Deliberately on a different scale ({20,40,70,100}) than the
/// classifier branch; both behaviors are preserved exactly.
pub fn fallback_risk_score(altitude_km: f64) -> u8 {
    if altitude_km < 300.0 {
        100
    } else if altitude_km < 350.0 {
        70
    } else if altitude_km < 400.0 {
        40
    } else {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_scores_are_coarse() {
        assert_eq!(class_to_score(RiskLevel::Low), 0);
        assert_eq!(class_to_score(RiskLevel::Medium), 50);
        assert_eq!(class_to_score(RiskLevel::High), 100);
    }

    #[test]
    fn fallback_tier_boundaries() {
        assert_eq!(fallback_risk_score(299.99), 100);
        assert_eq!(fallback_risk_score(300.0), 70);
        assert_eq!(fallback_risk_score(349.99), 70);
        assert_eq!(fallback_risk_score(350.0), 40);
        assert_eq!(fallback_risk_score(399.99), 40);
        assert_eq!(fallback_risk_score(400.0), 20);
        assert_eq!(fallback_risk_score(550.0), 20);
    }
}
