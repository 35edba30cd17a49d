use recommender_service::config::{ModelPathsConfig, ScoringConfig};
use recommender_service::services::ModelArtifacts;
use recommender_service::{LocalDataStore, PmfRecommender};

fn fixture_paths() -> ModelPathsConfig {
    ModelPathsConfig {
        pmf_model_path: "pmf-packagedata.json".to_string(),
        package_to_id_map: "package_to_index_map.json".to_string(),
        id_to_package_map: "index_to_package_map.json".to_string(),
        package_tag_map: "package_tag_map.json".to_string(),
        precomputed_stacks: "manifest_user_data.dat".to_string(),
        training_data_items: "packagedata-train-5-items.dat".to_string(),
    }
}

fn fixture_scoring() -> ScoringConfig {
    ScoringConfig {
        recommendation_threshold: 2,
        num_latent_factors: 4,
        min_confidence_prob: 0.0,
        a: 1.0,
        b: 0.01,
        lambda_u: 0.1,
        lambda_v: 10.0,
        lambda_r: 1.0,
        max_iter: 10,
        min_iter: 1,
        latent_cache_capacity: 16,
    }
}

async fn fixture_recommender() -> PmfRecommender {
    let store = LocalDataStore::new("tests/fixtures");
    let artifacts = ModelArtifacts::load(&store, &fixture_paths(), 4)
        .await
        .expect("fixture artifacts must load");
    PmfRecommender::new(artifacts, &fixture_scoring(), "npm".to_string())
}

fn stack(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_fixture_model_loads() {
    let store = LocalDataStore::new("tests/fixtures");
    let artifacts = ModelArtifacts::load(&store, &fixture_paths(), 4)
        .await
        .unwrap();

    assert_eq!(artifacts.item_matrix.dim(), (12, 4));
    assert_eq!(artifacts.user_matrix.dim(), (4, 4));
    assert_eq!(artifacts.weight_matrix.dim(), (12, 4));
    assert_eq!(artifacts.catalog.len(), 12);
    assert_eq!(artifacts.precomputed_stacks.len(), 4);
    // The empty training stack round-trips as an empty set.
    assert!(artifacts.precomputed_stacks[2].is_empty());
}

#[tokio::test]
async fn test_known_package_yields_threshold_recommendations() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["pon-logger"]), None);

    assert!(response.missing_packages.is_empty());
    assert_eq!(response.companion_packages.len(), 2);
    // pon-logger matches a precomputed stack, so no solve happens.
    assert_eq!(rec.solve_count(), 0);

    // Highest-scoring non-owned items under the matched user vector.
    assert_eq!(response.companion_packages[0].package_name, "chalk");
    assert_eq!(response.companion_packages[1].package_name, "moment");
    assert_eq!(
        response.companion_packages[0].topic_list,
        vec!["color".to_string(), "terminal".to_string()]
    );
}

#[tokio::test]
async fn test_missing_alongside_known_still_recommends() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["pon-logger", "totally-unknown-xyz"]), None);

    assert_eq!(response.missing_packages, vec!["totally-unknown-xyz"]);
    assert!(!response.companion_packages.is_empty());
}

#[tokio::test]
async fn test_unknown_only_stack_returns_empty_everything() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["totally-unknown-xyz"]), None);

    assert_eq!(response.missing_packages, vec!["totally-unknown-xyz"]);
    assert!(response.companion_packages.is_empty());
    assert!(response.package_to_topic_dict.is_empty());
}

#[tokio::test]
async fn test_exact_precomputed_stack_is_deterministic() {
    let rec = fixture_recommender().await;
    let five = stack(&["async", "colors", "request", "underscore", "pkginfo"]);

    let first = rec.predict(&five, None);
    assert!(!first.companion_packages.is_empty());
    assert_eq!(rec.solve_count(), 0);

    // Exact match against the stored 5-package stack ranks by that user's
    // precomputed vector: chalk then moment, every time.
    assert_eq!(first.companion_packages[0].package_name, "chalk");
    assert_eq!(first.companion_packages[1].package_name, "moment");

    let second = rec.predict(&five, None);
    for (a, b) in first
        .companion_packages
        .iter()
        .zip(second.companion_packages.iter())
    {
        assert_eq!(a.package_name, b.package_name);
        assert!((a.cooccurrence_probability - b.cooccurrence_probability).abs() < 1e-12);
    }
}

#[tokio::test]
async fn test_fully_unresolved_pair_short_circuits_without_solves() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["nope-one", "nope-two"]), None);

    assert_eq!(response.missing_packages.len(), 2);
    assert!(response.companion_packages.is_empty());
    assert_eq!(rec.solve_count(), 0);
}

#[tokio::test]
async fn test_novel_stack_solves_and_never_recommends_owned() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["express", "lodash"]), Some(5));

    // No stored stack contains {express, lodash}: solver path.
    assert_eq!(rec.solve_count(), 1);
    assert!(!response.companion_packages.is_empty());
    for companion in &response.companion_packages {
        assert_ne!(companion.package_name, "express");
        assert_ne!(companion.package_name, "lodash");
    }

    // Confidence is a percentage and descends with rank.
    for pair in response.companion_packages.windows(2) {
        assert!(pair[0].cooccurrence_probability >= pair[1].cooccurrence_probability);
    }
    for companion in &response.companion_packages {
        assert!(companion.cooccurrence_probability >= 0.0);
        assert!(companion.cooccurrence_probability <= 100.0);
    }
}

#[tokio::test]
async fn test_response_serializes_with_expected_shape() {
    let rec = fixture_recommender().await;
    let response = rec.predict(&stack(&["pon-logger"]), None);

    let value = serde_json::to_value(&response).unwrap();
    assert!(value.get("missing_packages").is_some());
    assert!(value.get("companion_packages").is_some());
    assert_eq!(value["ecosystem"], "npm");
    assert!(value["package_to_topic_dict"]["pon-logger"].is_array());
    assert!(value["companion_packages"][0]["cooccurrence_probability"].is_number());
}
