use ndarray::{Array1, Array2, Axis};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("closed-form system is singular, no latent vector exists for this item set")]
    SingularSystem,

    #[error("item set is empty")]
    EmptyItemSet,

    #[error("item id {id} outside catalog of {catalog} items")]
    ItemOutOfRange { id: usize, catalog: usize },
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Confidence weights of the PMF objective, shared between training and
/// online scoring.
#[derive(Debug, Clone, Copy)]
pub struct PmfWeights {
    pub a: f64,
    pub b: f64,
    pub lambda_u: f64,
}

/// Online PMF scorer: computes the latent vector of a user stack that was
/// never observed at training time.
///
/// This mirrors the per-user M-step of the training-time alternating least
/// squares, but as a single closed-form ridge-regression solve: `V` is
/// frozen at serving time, so no iteration is needed.
pub struct PmfScorer {
    item_matrix: Arc<Array2<f64>>,
    /// Request-independent part of the normal matrix:
    /// `b * V_R^T V_R + lambda_u * I`, where `R` is the set of items with at
    /// least one training user. Built once at construction.
    base_normal: Array2<f64>,
    weights: PmfWeights,
    solves: AtomicU64,
}

impl PmfScorer {
    pub fn new(
        item_matrix: Arc<Array2<f64>>,
        item_user_sets: &[HashSet<usize>],
        weights: PmfWeights,
    ) -> Self {
        let num_latent = item_matrix.ncols();

        let rated_ids: Vec<usize> = item_user_sets
            .iter()
            .enumerate()
            .filter(|(_, users)| !users.is_empty())
            .map(|(id, _)| id)
            .collect();
        let rated = item_matrix.select(Axis(0), &rated_ids);

        let mut base_normal = rated.t().dot(&rated) * weights.b;
        for i in 0..num_latent {
            base_normal[[i, i]] += weights.lambda_u;
        }

        debug!(
            rated_items = rated_ids.len(),
            num_latent, "Precomputed scorer normal matrix"
        );

        Self {
            item_matrix,
            base_normal,
            weights,
            solves: AtomicU64::new(0),
        }
    }

    /// Closed-form latent vector for a novel set of item ids:
    /// solve `(base + (a - b) * V_S^T V_S) x = a * sum_{j in S} V_j`.
    pub fn latent_for_items(&self, item_ids: &[usize]) -> Result<Array1<f64>> {
        if item_ids.is_empty() {
            return Err(ScoringError::EmptyItemSet);
        }
        let catalog = self.item_matrix.nrows();
        if let Some(&id) = item_ids.iter().find(|&&id| id >= catalog) {
            return Err(ScoringError::ItemOutOfRange { id, catalog });
        }

        let stack = self.item_matrix.select(Axis(0), item_ids);

        let mut normal = self.base_normal.clone();
        normal += &(stack.t().dot(&stack) * (self.weights.a - self.weights.b));

        let rhs = stack.sum_axis(Axis(0)) * self.weights.a;

        self.solves.fetch_add(1, Ordering::Relaxed);
        cholesky_solve(&normal, &rhs)
    }

    /// Number of closed-form solves performed so far. The matcher and
    /// short-circuit paths must leave this untouched.
    pub fn solve_count(&self) -> u64 {
        self.solves.load(Ordering::Relaxed)
    }
}

/// Solve `A x = b` for symmetric positive definite `A` via Cholesky
/// factorization. A non-positive or non-finite pivot means the system is
/// degenerate and there is no usable latent vector.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return Err(ScoringError::SingularSystem);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn test_weights() -> PmfWeights {
        PmfWeights {
            a: 1.0,
            b: 0.01,
            lambda_u: 0.1,
        }
    }

    fn test_scorer() -> PmfScorer {
        // 4 items, 2 latent factors; item 3 has no training users.
        let v = array![[0.9, 0.1], [0.2, 0.8], [0.5, 0.5], [0.3, 0.3]];
        let item_user_sets: Vec<HashSet<usize>> = vec![
            [0].into_iter().collect(),
            [0, 1].into_iter().collect(),
            [1].into_iter().collect(),
            HashSet::new(),
        ];
        PmfScorer::new(Arc::new(v), &item_user_sets, test_weights())
    }

    #[test]
    fn test_latent_satisfies_normal_equations() {
        let scorer = test_scorer();
        let item_ids = vec![0, 2];
        let x = scorer.latent_for_items(&item_ids).unwrap();

        // Rebuild A and rhs independently and check the residual.
        let v = array![[0.9, 0.1], [0.2, 0.8], [0.5, 0.5], [0.3, 0.3]];
        let rated = v.select(Axis(0), &[0, 1, 2]);
        let stack = v.select(Axis(0), &item_ids);
        let w = test_weights();

        let mut a_mat = rated.t().dot(&rated) * w.b + stack.t().dot(&stack) * (w.a - w.b);
        for i in 0..2 {
            a_mat[[i, i]] += w.lambda_u;
        }
        let rhs = stack.sum_axis(Axis(0)) * w.a;

        let residual = &a_mat.dot(&x) - &rhs;
        for r in residual.iter() {
            assert!(r.abs() < 1e-10, "residual too large: {}", r);
        }
    }

    #[test]
    fn test_latent_has_model_dimension() {
        let scorer = test_scorer();
        let x = scorer.latent_for_items(&[1]).unwrap();
        assert_eq!(x.len(), 2);
    }

    #[test]
    fn test_empty_item_set_rejected() {
        let scorer = test_scorer();
        assert!(matches!(
            scorer.latent_for_items(&[]),
            Err(ScoringError::EmptyItemSet)
        ));
    }

    #[test]
    fn test_out_of_range_item_rejected() {
        let scorer = test_scorer();
        assert!(matches!(
            scorer.latent_for_items(&[99]),
            Err(ScoringError::ItemOutOfRange { id: 99, .. })
        ));
    }

    #[test]
    fn test_zero_model_without_regularization_is_singular() {
        let v = Array2::<f64>::zeros((3, 2));
        let item_user_sets: Vec<HashSet<usize>> =
            vec![[0].into_iter().collect(), HashSet::new(), HashSet::new()];
        let scorer = PmfScorer::new(
            Arc::new(v),
            &item_user_sets,
            PmfWeights {
                a: 1.0,
                b: 0.01,
                lambda_u: 0.0,
            },
        );

        assert!(matches!(
            scorer.latent_for_items(&[0, 1]),
            Err(ScoringError::SingularSystem)
        ));
    }

    #[test]
    fn test_solve_counter_increments() {
        let scorer = test_scorer();
        assert_eq!(scorer.solve_count(), 0);

        scorer.latent_for_items(&[0]).unwrap();
        scorer.latent_for_items(&[0, 1]).unwrap();
        assert_eq!(scorer.solve_count(), 2);

        // Guard-rejected calls do not count as solves.
        let _ = scorer.latent_for_items(&[]);
        assert_eq!(scorer.solve_count(), 2);
    }

    #[test]
    fn test_cholesky_solve_identity() {
        let a = Array2::<f64>::eye(3);
        let b = array![1.0, 2.0, 3.0];
        let x = cholesky_solve(&a, &b).unwrap();
        for (xi, bi) in x.iter().zip(b.iter()) {
            assert!((xi - bi).abs() < 1e-12);
        }
    }
}
