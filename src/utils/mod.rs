// Utility functions for recommender-service

/// Logistic squashing used by the confidence calibration.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Indices of `scores` sorted by score descending. Ties, and any pair that
/// does not compare (NaN), fall back to ascending index.
pub fn argsort_descending(scores: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&i, &j| {
        scores[j]
            .partial_cmp(&scores[i])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_at_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sigmoid_is_monotonic() {
        assert!(sigmoid(1.0) > sigmoid(0.5));
        assert!(sigmoid(-0.5) > sigmoid(-1.0));
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_argsort_descending() {
        let scores = vec![0.2, 0.9, 0.5, 0.9];
        // Tie between index 1 and 3 resolves to the lower index first.
        assert_eq!(argsort_descending(&scores), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_argsort_empty() {
        assert!(argsort_descending(&[]).is_empty());
    }
}
