use serde::{Deserialize, Serialize};

/// RMSE / MAE / R² over paired actual/predicted series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub samples: usize,
}

impl RegressionMetrics {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Option<RegressionMetrics> {
        debug_assert_eq!(actual.len(), predicted.len());
        let n = actual.len();
        if n == 0 {
            return None;
        }

        let mut sq_err = 0.0;
        let mut abs_err = 0.0;
        for (a, p) in actual.iter().zip(predicted) {
            let e = p - a;
            sq_err += e * e;
            abs_err += e.abs();
        }

        let mean = actual.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
        // With zero variance in the target, R² is defined as 0 here
        // rather than dividing by zero.
        let r2 = if ss_tot > 0.0 { 1.0 - sq_err / ss_tot } else { 0.0 };

        Some(RegressionMetrics {
            rmse: (sq_err / n as f64).sqrt(),
            mae: abs_err / n as f64,
            r2,
            samples: n,
        })
    }
}

/// Classifier accuracy on a held-out set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}
