use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::gbt::GbtClassifier;
use crate::physics::AtmosphereParams;

/// The single persisted artifact: trained classifier (if any) plus the
/// physics constants it was calibrated against. Loaded whole at
/// startup; a partial or malformed bundle is a fatal error, while a
/// bundle with no classifier is valid and routes risk scoring to the
/// altitude-threshold fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub classifier: Option<GbtClassifier>,
    pub atmosphere: AtmosphereParams,
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ModelBundle {
    /// Physics-only bundle, used when serving without a trained model.
    pub fn physics_only() -> Self {
        ModelBundle {
            classifier: None,
            atmosphere: AtmosphereParams::default(),
            trained_at: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let bundle = serde_json::from_str(&content)?;
        Ok(bundle)
    }

    /// Atomic save: write to a temp file in the target directory, then
    /// rename over the destination so readers never observe a partial
    /// bundle.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::gbt::GbtConfig;
    use crate::features::RiskLevel;

    #[test]
    fn round_trips_through_disk() {
        let features: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, (i % 3) as f64])
            .collect();
        let labels: Vec<RiskLevel> = (0..40)
            .map(|i| RiskLevel::from_class_index(if i < 20 { 0 } else { 2 }))
            .collect();
        let classifier = GbtClassifier::fit(&features, &labels, GbtConfig::default()).unwrap();

        let bundle = ModelBundle {
            classifier: Some(classifier),
            atmosphere: AtmosphereParams::default(),
            trained_at: Some(chrono::Utc::now()),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        bundle.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.atmosphere, bundle.atmosphere);
        let clf = loaded.classifier.unwrap();
        assert_eq!(clf.predict(&[2.0, 0.0]).unwrap(), RiskLevel::Low);
        assert_eq!(clf.predict(&[35.0, 1.0]).unwrap(), RiskLevel::High);
    }

    #[test]
    fn malformed_bundle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, "{ \"classifier\": ").unwrap();
        assert!(matches!(
            ModelBundle::load(&path),
            Err(ModelError::Format(_))
        ));
    }

    #[test]
    fn missing_bundle_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ModelBundle::load(&dir.path().join("nope.json")),
            Err(ModelError::Io(_))
        ));
    }
}
