pub mod config;
pub mod data_store;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use data_store::{DataStore, LocalDataStore, S3DataStore};
pub use services::{ModelArtifacts, PmfRecommender, PmfScorer, Ranker, StackMatcher};
