use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use super::error::TrainError;
use super::metrics::{ClassifierMetrics, RegressionMetrics};
use crate::features::{derive_features, FeatureRow};
use crate::model::{GbtClassifier, GbtConfig, ModelBundle};
use crate::physics::{decay_rate_km_day, AtmosphereParams};
use crate::sources::{ElementSource, SolarSource};

/// Verified decayed Starlink objects with dense TLE coverage; the
/// default corpus for offline training.
pub const DEFAULT_TRAINING_SATELLITES: [u32; 12] = [
    56118, 46169, 46293, 48093, 50040, 53563, 59051, 59729, 44942, 45178, 45120, 45774,
];

const MIN_RAW_ROWS_PER_SATELLITE: usize = 10;
const MIN_JOINED_ROWS_PER_SATELLITE: usize = 5;
const MIN_TOTAL_ROWS: usize = 10;
const SPLIT_SEED: u64 = 42;
const TEST_FRACTION: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub norad_ids: Vec<u32>,
    pub days_back: u32,
    /// Keep only rows below this altitude, oversampling the fast-decay
    /// regime.
    pub max_altitude_km: Option<f64>,
    pub output: PathBuf,
}

/// Physics model quality report, overall and per altitude band.
#[derive(Debug, Clone, Serialize)]
pub struct PhysicsValidation {
    pub overall: RegressionMetrics,
    pub low_band: Option<RegressionMetrics>,
    pub mid_band: Option<RegressionMetrics>,
    pub high_band: Option<RegressionMetrics>,
}

#[derive(Debug, Serialize)]
pub struct TrainReport {
    pub physics: PhysicsValidation,
    pub classifier: ClassifierMetrics,
    pub total_samples: usize,
    pub satellites_used: usize,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}

/// Collect labeled rows for every requested satellite, skipping the
/// ones with too little usable history. Per-satellite failures are
/// logged and skipped; only an empty total is fatal.
pub async fn collect_dataset<E, S>(
    elements: &E,
    solar: &S,
    options: &TrainOptions,
) -> Result<(Vec<FeatureRow>, usize), TrainError>
where
    E: ElementSource,
    S: SolarSource,
{
    let mut rows = Vec::new();
    let mut satellites_used = 0usize;

    for (idx, &norad_id) in options.norad_ids.iter().enumerate() {
        log::info!(
            "[{}/{}] collecting history for NORAD {norad_id}",
            idx + 1,
            options.norad_ids.len()
        );

        let history = match elements.history(norad_id, options.days_back).await {
            Ok(h) => h,
            Err(e) => {
                log::warn!("NORAD {norad_id}: element history failed ({e}), skipping");
                continue;
            }
        };
        if history.len() < MIN_RAW_ROWS_PER_SATELLITE {
            log::warn!(
                "NORAD {norad_id}: only {} raw states, skipping",
                history.len()
            );
            continue;
        }

        let start = history.iter().map(|s| s.epoch).min().unwrap_or_else(Utc::now);
        let end = history.iter().map(|s| s.epoch).max().unwrap_or_else(Utc::now);
        let solar_series = match solar.historical(start - Duration::days(1), end).await {
            Ok(s) if !s.is_empty() => s,
            Ok(_) => {
                log::warn!("NORAD {norad_id}: empty solar series, skipping");
                continue;
            }
            Err(e) => {
                log::warn!("NORAD {norad_id}: solar history failed ({e}), skipping");
                continue;
            }
        };

        let mut derived = derive_features(history, &solar_series, true);
        if let Some(ceiling) = options.max_altitude_km {
            derived.retain(|r| r.altitude_km < ceiling);
        }
        if derived.len() < MIN_JOINED_ROWS_PER_SATELLITE {
            log::warn!(
                "NORAD {norad_id}: only {} joined rows, skipping",
                derived.len()
            );
            continue;
        }

        log::info!("NORAD {norad_id}: {} labeled rows", derived.len());
        rows.extend(derived);
        satellites_used += 1;
    }

    Ok((rows, satellites_used))
}

/// Compare the physics model's predicted daily decay against the
/// observed 7-day deltas. This is a quality report, not a gate:
/// callers train and save regardless of the numbers.
pub fn validate_physics(params: &AtmosphereParams, rows: &[FeatureRow]) -> Option<PhysicsValidation> {
    let actual: Vec<f64> = rows.iter().map(|r| r.altitude_7d_decay / 7.0).collect();
    let predicted: Vec<f64> = rows
        .iter()
        .map(|r| {
            decay_rate_km_day(
                params,
                r.altitude_km,
                r.f107_current,
                r.eccentricity,
                r.mean_motion,
            )
        })
        .collect();

    let overall = RegressionMetrics::compute(&actual, &predicted)?;

    let band = |lo: f64, hi: f64| {
        let (a, p): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .zip(actual.iter().zip(&predicted))
            .filter(|(r, _)| r.altitude_km >= lo && r.altitude_km < hi)
            .map(|(_, (a, p))| (*a, *p))
            .unzip();
        RegressionMetrics::compute(&a, &p)
    };

    Some(PhysicsValidation {
        overall,
        low_band: band(0.0, 300.0),
        mid_band: band(300.0, 400.0),
        high_band: band(400.0, f64::INFINITY),
    })
}

fn train_classifier(rows: &[FeatureRow]) -> Result<(GbtClassifier, ClassifierMetrics), TrainError> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let test_len = ((rows.len() as f64) * TEST_FRACTION).round() as usize;
    let (test_idx, train_idx) = indices.split_at(test_len.min(rows.len().saturating_sub(1)));

    let to_xy = |idx: &[usize]| {
        let x: Vec<Vec<f64>> = idx.iter().map(|&i| rows[i].vector().to_vec()).collect();
        let y: Vec<_> = idx
            .iter()
            .map(|&i| rows[i].label.expect("training rows are labeled"))
            .collect();
        (x, y)
    };
    let (train_x, train_y) = to_xy(train_idx);
    let (test_x, test_y) = to_xy(test_idx);

    let classifier = GbtClassifier::fit(&train_x, &train_y, GbtConfig::default())?;

    let accuracy = |x: &[Vec<f64>], y: &[crate::features::RiskLevel]| {
        if x.is_empty() {
            return 0.0;
        }
        let hits = x
            .iter()
            .zip(y)
            .filter(|(f, label)| classifier.predict(f).map(|p| p == **label).unwrap_or(false))
            .count();
        hits as f64 / x.len() as f64
    };

    let metrics = ClassifierMetrics {
        train_accuracy: accuracy(&train_x, &train_y),
        test_accuracy: accuracy(&test_x, &test_y),
        train_samples: train_x.len(),
        test_samples: test_x.len(),
    };

    Ok((classifier, metrics))
}

/// Full offline run: collect, validate the physics model, train the
/// classifier, persist the bundle and a metrics report next to it.
pub async fn train_and_save<E, S>(
    elements: &E,
    solar: &S,
    options: &TrainOptions,
) -> Result<TrainReport, TrainError>
where
    E: ElementSource,
    S: SolarSource,
{
    let (rows, satellites_used) = collect_dataset(elements, solar, options).await?;
    if rows.len() < MIN_TOTAL_ROWS {
        return Err(TrainError::InsufficientData {
            got: rows.len(),
            need: MIN_TOTAL_ROWS,
        });
    }
    log::info!(
        "dataset ready: {} rows from {} satellites",
        rows.len(),
        satellites_used
    );

    let atmosphere = AtmosphereParams::default();
    let physics = validate_physics(&atmosphere, &rows).ok_or(TrainError::InsufficientData {
        got: 0,
        need: MIN_TOTAL_ROWS,
    })?;
    log::info!(
        "physics model: RMSE {:.4} km/day, MAE {:.4} km/day, R² {:.4}",
        physics.overall.rmse,
        physics.overall.mae,
        physics.overall.r2
    );

    let (classifier, classifier_metrics) = train_classifier(&rows)?;
    log::info!(
        "risk classifier: train acc {:.3}, test acc {:.3}",
        classifier_metrics.train_accuracy,
        classifier_metrics.test_accuracy
    );
    if physics.overall.r2 < 0.0 {
        log::warn!(
            "physics model R² {:.3} is negative: worse than predicting the mean; saving anyway",
            physics.overall.r2
        );
    }

    let report = TrainReport {
        physics,
        classifier: classifier_metrics,
        total_samples: rows.len(),
        satellites_used,
        trained_at: Utc::now(),
    };

    let bundle = ModelBundle {
        classifier: Some(classifier),
        atmosphere,
        trained_at: Some(report.trained_at),
    };
    bundle.save(&options.output)?;
    log::info!("model bundle saved to {}", options.output.display());

    write_report(&report, &options.output)?;
    Ok(report)
}

fn write_report(report: &TrainReport, bundle_path: &Path) -> Result<(), TrainError> {
    let path = bundle_path.with_extension("metrics.json");
    let content = serde_json::to_string_pretty(report).map_err(crate::model::ModelError::from)?;
    std::fs::write(&path, content)?;
    log::info!("metrics report saved to {}", path.display());
    Ok(())
}
