use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::types::ScanHit;

/// Feature order the trained export expects: minimum distance, relative
/// velocity, and the velocity/distance ratio.
pub const FEATURE_COUNT: usize = 3;

/// The scorer is unavailable. Fatal to job start; never silently defaulted.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("model file unreadable: {0}")]
    Read(#[from] std::io::Error),
    #[error("model file malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("model {field} has {got} values, expected {expected}")]
    Shape {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("model scaler has a non-positive standard deviation")]
    Scale,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Calibration {
    pub steepness: f64,
    pub midpoint_km: f64,
}

/// Trained risk regression, exported to JSON: a standard scaler plus linear
/// weights, and the sigmoid calibration used to turn distance and risk into
/// a collision probability. Loaded once per process and shared read-only
/// across every candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskModel {
    pub scaler_mean: Vec<f64>,
    pub scaler_std: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub calibration: Calibration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskScore {
    pub risk_value: f64,
    pub collision_probability: f64,
}

impl RiskModel {
    pub fn load(path: &Path) -> Result<Self, ScorerError> {
        let content = fs::read_to_string(path)?;
        let model: RiskModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ScorerError> {
        for (field, values) in [
            ("scaler_mean", &self.scaler_mean),
            ("scaler_std", &self.scaler_std),
            ("weights", &self.weights),
        ] {
            if values.len() != FEATURE_COUNT {
                return Err(ScorerError::Shape {
                    field,
                    expected: FEATURE_COUNT,
                    got: values.len(),
                });
            }
        }
        if self.scaler_std.iter().any(|&s| s <= 0.0) {
            return Err(ScorerError::Scale);
        }
        Ok(())
    }

    /// Score one hit: standardized features through the regression for the
    /// continuous risk value, then a distance sigmoid blended with the
    /// clamped risk for the calibrated probability.
    pub fn score(&self, hit: &ScanHit) -> RiskScore {
        let features = feature_vector(hit);

        let mut risk_value = self.intercept;
        for i in 0..FEATURE_COUNT {
            let z = (features[i] - self.scaler_mean[i]) / self.scaler_std[i];
            risk_value += self.weights[i] * z;
        }

        let distance_term = 1.0
            / (1.0
                + (self.calibration.steepness
                    * (hit.min_distance_km - self.calibration.midpoint_km))
                    .exp());
        let collision_probability =
            (0.7 * distance_term + 0.3 * risk_value.clamp(0.0, 1.0)).clamp(0.0, 1.0);

        RiskScore {
            risk_value,
            collision_probability,
        }
    }
}

fn feature_vector(hit: &ScanHit) -> [f64; FEATURE_COUNT] {
    let distance = hit.min_distance_km;
    let velocity = hit.relative_velocity_km_s;
    [distance, velocity, velocity / distance.max(1e-3)]
}
