use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A pair whose sampled minimum separation fell below the scan threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHit {
    pub time_of_min: DateTime<Utc>,
    pub min_distance_km: f64,
    pub relative_velocity_km_s: f64,
}

/// Outcome of scanning one (user, catalog) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// Minimum separation below threshold.
    Hit(ScanHit),
    /// Scanned fine, never came close.
    Clear,
    /// Every sample failed to propagate; excluded from output.
    Unscored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Pure threshold function: probability above 0.7 is high, 0.3 and up
    /// is medium, otherwise low. Exactly 0.7 is medium, not high.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            RiskLevel::High
        } else if probability >= 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// A scored close approach. Immutable once produced; superseded by the
/// next completed run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConjunctionCandidate {
    pub user_satellite: String,
    pub catalog_satellite: String,
    pub time_of_closest_approach: DateTime<Utc>,
    pub min_distance_km: f64,
    pub relative_velocity_km_s: f64,
    pub risk_value: f64,
    pub collision_probability: f64,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_probability(0.75), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.1), RiskLevel::Low);
    }

    #[test]
    fn risk_level_boundaries_are_medium() {
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Medium);
    }

    #[test]
    fn risk_level_extremes() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::High);
    }
}
