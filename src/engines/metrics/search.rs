// src/engines/metrics/search.rs

/// Weight of first-to-last improvement in the meta score
pub const IMPROVEMENT_WEIGHT: f64 = 1.5;

pub struct SearchMetrics;

impl SearchMetrics {
    /// Peak best-of-generation fitness plus 1.5x the improvement from the
    /// first generation to the last. 0.0 when no generation ran.
    pub fn meta_score(history: &[f64]) -> f64 {
        let (first, last) = match (history.first(), history.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return 0.0,
        };

        let improvement = if history.len() > 1 { last - first } else { 0.0 };
        Self::peak(history) + improvement * IMPROVEMENT_WEIGHT
    }

    pub fn peak(history: &[f64]) -> f64 {
        history.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}
