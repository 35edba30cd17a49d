use crate::utils::{argsort_descending, sigmoid};
use ndarray::{Array1, Array2};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// One ranked catalog item with its calibrated confidence.
#[derive(Debug, Clone, Copy)]
pub struct RankedCompanion {
    pub package_id: usize,
    pub raw_score: f64,
    /// Percent (0-100), comparable only within a single response.
    pub confidence: f64,
}

/// Ranks every catalog item against a user latent vector and calibrates the
/// selected top-K into displayable confidence percentages.
pub struct Ranker {
    item_matrix: Arc<Array2<f64>>,
    min_confidence_prob: f64,
}

impl Ranker {
    pub fn new(item_matrix: Arc<Array2<f64>>, min_confidence_prob: f64) -> Self {
        Self {
            item_matrix,
            min_confidence_prob,
        }
    }

    /// Score all catalog items, drop the ones the user already has, keep the
    /// top `threshold` in rank order, then calibrate.
    ///
    /// Calibration is local to the response: the selected K scores are
    /// centered on their own mean before the sigmoid, so an item scoring
    /// exactly at the mean calibrates to 50%. The `min_confidence_prob`
    /// cutoff applies after the top-K truncation, so a strict cutoff can
    /// legitimately return fewer than `threshold` items.
    pub fn companions(
        &self,
        latent: &Array1<f64>,
        owned: &HashSet<usize>,
        threshold: usize,
    ) -> Vec<RankedCompanion> {
        let raw_scores: Vec<f64> = self.item_matrix.dot(latent).to_vec();

        let selected: Vec<(usize, f64)> = argsort_descending(&raw_scores)
            .into_iter()
            .filter(|id| !owned.contains(id))
            .take(threshold)
            .map(|id| (id, raw_scores[id]))
            .collect();

        if selected.is_empty() {
            return Vec::new();
        }

        let mean = selected.iter().map(|(_, s)| s).sum::<f64>() / selected.len() as f64;

        let companions: Vec<RankedCompanion> = selected
            .into_iter()
            .map(|(package_id, raw_score)| RankedCompanion {
                package_id,
                raw_score,
                confidence: 100.0 * sigmoid(raw_score - mean),
            })
            .filter(|c| c.confidence >= self.min_confidence_prob)
            .collect();

        debug!(
            selected = companions.len(),
            threshold, "Ranked and calibrated companions"
        );

        companions
    }
}
