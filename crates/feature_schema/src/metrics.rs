use serde::{Deserialize, Serialize};

/// Regression quality on a held-out split, in target units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
}

impl Metrics {
    /// Computes R², MAE and RMSE.
    ///
    /// Returns `None` when the slices are empty or differ in length.
    /// A constant target yields R² of 1 for a perfect fit and 0 otherwise.
    #[must_use]
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }
        let n = actual.len() as f64;

        let mean = actual.iter().sum::<f64>() / n;
        let mut abs_err = 0.0;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (&y, &p) in actual.iter().zip(predicted) {
            abs_err += (y - p).abs();
            ss_res += (y - p).powi(2);
            ss_tot += (y - mean).powi(2);
        }

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            r2,
            mae: abs_err / n,
            rmse: (ss_res / n).sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_metrics_values() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        let m = Metrics::compute(&actual, &predicted).unwrap();

        assert_relative_eq!(m.mae, 0.5);
        assert_relative_eq!(m.rmse, 0.375_f64.sqrt());
        assert_relative_eq!(m.r2, 0.948_608_137_044_967_9, epsilon = 1e-12);
    }

    #[test]
    fn test_perfect_and_degenerate() {
        let perfect = Metrics::compute(&[1.0, 2.0], &[1.0, 2.0]).unwrap();
        assert_relative_eq!(perfect.r2, 1.0);
        assert_relative_eq!(perfect.rmse, 0.0);

        let constant = Metrics::compute(&[5.0, 5.0], &[4.0, 6.0]).unwrap();
        assert_relative_eq!(constant.r2, 0.0);

        assert!(Metrics::compute(&[], &[]).is_none());
        assert!(Metrics::compute(&[1.0], &[1.0, 2.0]).is_none());
    }
}
