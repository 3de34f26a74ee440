use proptest::prelude::*;
use webaudit::complexity::{average_combined_score, rating_for_score};
use webaudit::config::ComplexityThresholds;
use webaudit::ComplexityMetrics;

proptest! {
    /// Property: a higher average score never yields a better rating
    #[test]
    fn prop_rating_is_monotonic(a in 0.0f64..60.0, b in 0.0f64..60.0) {
        let thresholds = ComplexityThresholds::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rating_for_score(low, &thresholds) <= rating_for_score(high, &thresholds));
    }

    /// Property: the average lies between the smallest and largest combined score
    #[test]
    fn prop_average_is_bounded(pairs in prop::collection::vec((1u32..40, 0u32..60), 1..20)) {
        let metrics: Vec<ComplexityMetrics> = pairs
            .iter()
            .map(|&(cyclomatic, cognitive)| ComplexityMetrics {
                cyclomatic,
                cognitive,
                ..Default::default()
            })
            .collect();
        let scores: Vec<f64> = metrics.iter().map(ComplexityMetrics::combined_score).collect();
        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let average = average_combined_score(&metrics);
        prop_assert!(average >= min - 1e-9 && average <= max + 1e-9);
    }
}
