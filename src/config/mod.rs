use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub paths: ModelPathsConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    /// Ecosystem this instance serves (npm, maven or pypi). One model per
    /// ecosystem; the value is echoed back in every response.
    pub ecosystem: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// "local" or "s3"
    pub backend: String,
    pub local_data_dir: String,
    pub s3_bucket: String,
    pub s3_region: String,
}

/// Well-known relative paths of the model artifacts inside the data store.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPathsConfig {
    pub pmf_model_path: String,
    pub package_to_id_map: String,
    pub id_to_package_map: String,
    pub package_tag_map: String,
    pub precomputed_stacks: String,
    pub training_data_items: String,
}

/// PMF hyperparameters. The same weights are used at training time and at
/// online-scoring time; `max_iter`/`min_iter` bound the training loop only
/// and are not exercised by the online scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub recommendation_threshold: usize,
    pub num_latent_factors: usize,
    /// Calibrated-confidence cutoff, percent (0-100).
    pub min_confidence_prob: f64,
    pub a: f64,
    pub b: f64,
    pub lambda_u: f64,
    pub lambda_v: f64,
    pub lambda_r: f64,
    pub max_iter: usize,
    pub min_iter: usize,
    pub latent_cache_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "recommender-service".to_string()),
                ecosystem: env::var("ECOSYSTEM").unwrap_or_else(|_| "npm".to_string()),
            },
            storage: StorageConfig {
                backend: env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string()),
                local_data_dir: env::var("LOCAL_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
                s3_bucket: env::var("S3_BUCKET")
                    .unwrap_or_else(|_| "hpf-insights".to_string()),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            },
            paths: ModelPathsConfig {
                pmf_model_path: env::var("PMF_MODEL_PATH")
                    .unwrap_or_else(|_| "models/cvae-model/pmf-packagedata.json".to_string()),
                package_to_id_map: env::var("PACKAGE_TO_ID_MAP")
                    .unwrap_or_else(|_| "node-pmf-scoring/package_to_index_map.json".to_string()),
                id_to_package_map: env::var("ID_TO_PACKAGE_MAP")
                    .unwrap_or_else(|_| "node-pmf-scoring/index_to_package_map.json".to_string()),
                package_tag_map: env::var("PACKAGE_TAG_MAP")
                    .unwrap_or_else(|_| "node-pmf-scoring/package_tag_map.json".to_string()),
                precomputed_stacks: env::var("PRECOMPUTED_STACKS")
                    .unwrap_or_else(|_| "training-data-node/manifest_user_data.dat".to_string()),
                training_data_items: env::var("TRAINING_DATA_ITEMS").unwrap_or_else(|_| {
                    "training-data-node/packagedata-train-5-items.dat".to_string()
                }),
            },
            scoring: ScoringConfig {
                recommendation_threshold: env::var("RECOMMENDATION_THRESHOLD")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("RECOMMENDATION_THRESHOLD must be a valid usize"),
                num_latent_factors: env::var("NUM_LATENT_FACTORS")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("NUM_LATENT_FACTORS must be a valid usize"),
                min_confidence_prob: env::var("MIN_CONFIDENCE_PROB")
                    .unwrap_or_else(|_| "30.0".to_string())
                    .parse()
                    .expect("MIN_CONFIDENCE_PROB must be a valid f64"),
                a: env::var("PMF_A")
                    .unwrap_or_else(|_| "1.0".to_string())
                    .parse()
                    .expect("PMF_A must be a valid f64"),
                b: env::var("PMF_B")
                    .unwrap_or_else(|_| "0.01".to_string())
                    .parse()
                    .expect("PMF_B must be a valid f64"),
                lambda_u: env::var("PMF_LAMBDA_U")
                    .unwrap_or_else(|_| "0.1".to_string())
                    .parse()
                    .expect("PMF_LAMBDA_U must be a valid f64"),
                lambda_v: env::var("PMF_LAMBDA_V")
                    .unwrap_or_else(|_| "10.0".to_string())
                    .parse()
                    .expect("PMF_LAMBDA_V must be a valid f64"),
                lambda_r: env::var("PMF_LAMBDA_R")
                    .unwrap_or_else(|_| "1.0".to_string())
                    .parse()
                    .expect("PMF_LAMBDA_R must be a valid f64"),
                max_iter: env::var("PMF_MAX_ITER")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("PMF_MAX_ITER must be a valid usize"),
                min_iter: env::var("PMF_MIN_ITER")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .expect("PMF_MIN_ITER must be a valid usize"),
                latent_cache_capacity: env::var("LATENT_CACHE_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .expect("LATENT_CACHE_CAPACITY must be a valid usize"),
            },
        })
    }
}
