pub mod artifacts;
pub mod matcher;
pub mod ranking;
pub mod rating;
pub mod recommender;
pub mod scoring;

pub use artifacts::ModelArtifacts;
pub use matcher::StackMatcher;
pub use ranking::Ranker;
pub use recommender::PmfRecommender;
pub use scoring::PmfScorer;
