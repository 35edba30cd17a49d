mod cache;

use crate::config::ScoringConfig;
use crate::models::{Recommendation, RecommendResponse};
use crate::services::artifacts::{ModelArtifacts, PackageCatalog};
use crate::services::matcher::StackMatcher;
use crate::services::ranking::Ranker;
use crate::services::scoring::{PmfScorer, PmfWeights, ScoringError};
use cache::LatentCache;
use ndarray::{Array1, Array2};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The recommendation service facade: one instance per process, constructed
/// once from the loaded artifacts and shared read-only across request
/// workers. `predict` is the single entry point.
pub struct PmfRecommender {
    ecosystem: String,
    default_threshold: usize,
    catalog: PackageCatalog,
    package_tag_map: HashMap<String, Vec<String>>,
    user_matrix: Array2<f64>,
    matcher: StackMatcher,
    scorer: PmfScorer,
    ranker: Ranker,
    latent_cache: LatentCache,
}

impl PmfRecommender {
    pub fn new(artifacts: ModelArtifacts, scoring: &ScoringConfig, ecosystem: String) -> Self {
        let item_matrix = Arc::new(artifacts.item_matrix);

        let scorer = PmfScorer::new(
            Arc::clone(&item_matrix),
            &artifacts.item_user_sets,
            PmfWeights {
                a: scoring.a,
                b: scoring.b,
                lambda_u: scoring.lambda_u,
            },
        );
        let ranker = Ranker::new(Arc::clone(&item_matrix), scoring.min_confidence_prob);
        let matcher = StackMatcher::new(artifacts.precomputed_stacks);

        info!(
            ecosystem = %ecosystem,
            packages = artifacts.catalog.len(),
            precomputed_stacks = matcher.len(),
            "Recommender ready"
        );

        Self {
            ecosystem,
            default_threshold: scoring.recommendation_threshold,
            catalog: artifacts.catalog,
            package_tag_map: artifacts.package_tag_map,
            user_matrix: artifacts.user_matrix,
            matcher,
            scorer,
            ranker,
            latent_cache: LatentCache::new(scoring.latent_cache_capacity),
        }
    }

    /// Recommend companion packages for a partial dependency stack.
    ///
    /// Per-request conditions (unknown packages, low-signal stacks,
    /// degenerate solves) never fail the call; they surface as empty lists
    /// in the response.
    pub fn predict(
        &self,
        package_list: &[String],
        threshold_override: Option<usize>,
    ) -> RecommendResponse {
        let threshold = threshold_override.unwrap_or(self.default_threshold);

        let (known, missing) = self.partition_stack(package_list);

        let package_to_topic_dict: HashMap<String, Vec<String>> = known
            .iter()
            .map(|(name, _)| {
                let topics = self
                    .package_tag_map
                    .get(name)
                    .cloned()
                    .unwrap_or_default();
                (name.clone(), topics)
            })
            .collect();

        // Low-signal guard: without a resolvable majority there is nothing
        // worth scoring against.
        if known.is_empty() || missing.len() > known.len() {
            info!(
                known = known.len(),
                missing = missing.len(),
                "Insufficient signal, skipping recommendation"
            );
            return RecommendResponse {
                missing_packages: missing,
                companion_packages: Vec::new(),
                ecosystem: self.ecosystem.clone(),
                package_to_topic_dict,
            };
        }

        let known_ids: HashSet<usize> = known.iter().map(|&(_, id)| id).collect();

        let companion_packages = match self.resolve_latent(&known_ids) {
            Ok(latent) => self
                .ranker
                .companions(latent.as_ref(), &known_ids, threshold)
                .into_iter()
                .filter_map(|ranked| {
                    self.catalog
                        .name_of(ranked.package_id)
                        .map(|name| Recommendation {
                            package_name: name.to_string(),
                            cooccurrence_probability: ranked.confidence,
                            topic_list: self
                                .package_tag_map
                                .get(name)
                                .cloned()
                                .unwrap_or_default(),
                        })
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "No latent vector for this stack, returning no recommendations");
                Vec::new()
            }
        };

        RecommendResponse {
            missing_packages: missing,
            companion_packages,
            ecosystem: self.ecosystem.clone(),
            package_to_topic_dict,
        }
    }

    /// Number of closed-form solves performed since startup.
    pub fn solve_count(&self) -> u64 {
        self.scorer.solve_count()
    }

    /// Split the request into resolvable (name, id) pairs and unresolved
    /// names, preserving request order and dropping duplicates.
    fn partition_stack(&self, package_list: &[String]) -> (Vec<(String, usize)>, Vec<String>) {
        let mut known = Vec::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for name in package_list {
            if !seen.insert(name.as_str()) {
                continue;
            }
            match self.catalog.id_of(name) {
                Some(id) => known.push((name.clone(), id)),
                None => missing.push(name.clone()),
            }
        }

        (known, missing)
    }

    /// Reuse a precomputed user vector when the stack matches or is
    /// contained in a training stack; otherwise fall back to the cache, and
    /// last to the closed-form solve.
    fn resolve_latent(
        &self,
        known_ids: &HashSet<usize>,
    ) -> Result<Arc<Array1<f64>>, ScoringError> {
        if let Some(hit) = self.matcher.find_closest(known_ids) {
            debug!(
                user_index = hit.user_index,
                diff = hit.diff,
                "Reusing precomputed user vector"
            );
            return Ok(Arc::new(self.user_matrix.row(hit.user_index).to_owned()));
        }

        let mut cache_key: Vec<usize> = known_ids.iter().copied().collect();
        cache_key.sort_unstable();

        if let Some(latent) = self.latent_cache.get(&cache_key) {
            debug!("Latent cache hit");
            return Ok(latent);
        }

        let latent = Arc::new(self.scorer.latent_for_items(&cache_key)?);
        self.latent_cache.insert(cache_key, Arc::clone(&latent));
        Ok(latent)
    }
}
