use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{ConjunctionCandidate, RiskLevel};

/// Rollup of one completed run. The itemized candidate list is retained so
/// callers can ask for either the summary or the detail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisSummary {
    pub completed_at: DateTime<Utc>,
    pub threshold_km: f64,
    pub total_pairs: usize,
    /// Pairs that produced a usable scan, hit or clear.
    pub successful_predictions: usize,
    pub unscored_pairs: usize,
    /// Pairs whose minimum separation fell below the threshold.
    pub conjunction_count: usize,
    pub average_distance_km: f64,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub average_relative_velocity_km_s: f64,
    pub max_relative_velocity_km_s: f64,
    pub average_risk_value: f64,
    pub average_collision_probability: f64,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub candidates: Vec<ConjunctionCandidate>,
}

/// Reduce scored candidates into summary statistics. All statistics are
/// commutative over the candidate list, so the order candidates arrive in
/// does not matter; the stored list is sorted by collision probability.
pub fn summarize(
    mut candidates: Vec<ConjunctionCandidate>,
    total_pairs: usize,
    unscored_pairs: usize,
    threshold_km: f64,
) -> AnalysisSummary {
    candidates.sort_by(|a, b| {
        b.collision_probability
            .partial_cmp(&a.collision_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = candidates.len();
    let mean = |f: fn(&ConjunctionCandidate) -> f64| {
        if n == 0 {
            0.0
        } else {
            candidates.iter().map(f).sum::<f64>() / n as f64
        }
    };
    let fold_distance = |init: f64, pick: fn(f64, f64) -> f64| {
        candidates
            .iter()
            .map(|c| c.min_distance_km)
            .fold(init, pick)
    };

    let count_level = |level: RiskLevel| candidates.iter().filter(|c| c.risk_level == level).count();

    AnalysisSummary {
        completed_at: Utc::now(),
        threshold_km,
        total_pairs,
        successful_predictions: total_pairs.saturating_sub(unscored_pairs),
        unscored_pairs,
        conjunction_count: n,
        average_distance_km: mean(|c| c.min_distance_km),
        min_distance_km: if n == 0 { 0.0 } else { fold_distance(f64::INFINITY, f64::min) },
        max_distance_km: if n == 0 { 0.0 } else { fold_distance(f64::NEG_INFINITY, f64::max) },
        average_relative_velocity_km_s: mean(|c| c.relative_velocity_km_s),
        max_relative_velocity_km_s: candidates
            .iter()
            .map(|c| c.relative_velocity_km_s)
            .fold(0.0, f64::max),
        average_risk_value: mean(|c| c.risk_value),
        average_collision_probability: mean(|c| c.collision_probability),
        high_risk_count: count_level(RiskLevel::High),
        medium_risk_count: count_level(RiskLevel::Medium),
        low_risk_count: count_level(RiskLevel::Low),
        candidates,
    }
}

/// Persist the summary, overwriting the previous run's artifact.
pub fn save_summary(path: &Path, summary: &AnalysisSummary) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(distance: f64, velocity: f64, probability: f64) -> ConjunctionCandidate {
        ConjunctionCandidate {
            user_satellite: "USER".into(),
            catalog_satellite: "CAT".into(),
            time_of_closest_approach: Utc.with_ymd_and_hms(2008, 9, 20, 13, 0, 0).unwrap(),
            min_distance_km: distance,
            relative_velocity_km_s: velocity,
            risk_value: probability,
            collision_probability: probability,
            risk_level: RiskLevel::from_probability(probability),
        }
    }

    #[test]
    fn statistics_over_a_known_set() {
        let summary = summarize(
            vec![
                candidate(10.0, 2.0, 0.8),
                candidate(30.0, 4.0, 0.5),
                candidate(50.0, 6.0, 0.1),
            ],
            10,
            2,
            100.0,
        );

        assert_eq!(summary.total_pairs, 10);
        assert_eq!(summary.successful_predictions, 8);
        assert_eq!(summary.unscored_pairs, 2);
        assert_eq!(summary.conjunction_count, 3);
        assert!((summary.average_distance_km - 30.0).abs() < 1e-9);
        assert_eq!(summary.min_distance_km, 10.0);
        assert_eq!(summary.max_distance_km, 50.0);
        assert!((summary.average_relative_velocity_km_s - 4.0).abs() < 1e-9);
        assert_eq!(summary.max_relative_velocity_km_s, 6.0);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.medium_risk_count, 1);
        assert_eq!(summary.low_risk_count, 1);
    }

    #[test]
    fn candidates_are_sorted_by_probability() {
        let summary = summarize(
            vec![candidate(1.0, 1.0, 0.2), candidate(2.0, 1.0, 0.9)],
            2,
            0,
            100.0,
        );
        assert!(summary.candidates[0].collision_probability > summary.candidates[1].collision_probability);
    }

    #[test]
    fn empty_run_produces_zeroed_statistics() {
        let summary = summarize(Vec::new(), 4, 4, 100.0);
        assert_eq!(summary.conjunction_count, 0);
        assert_eq!(summary.successful_predictions, 0);
        assert_eq!(summary.average_distance_km, 0.0);
        assert_eq!(summary.min_distance_km, 0.0);
        assert_eq!(summary.max_distance_km, 0.0);
    }
}
