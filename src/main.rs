use anyhow::Context;
use recommender_service::models::{Ecosystem, RecommendRequest};
use recommender_service::{Config, DataStore, LocalDataStore, PmfRecommender, S3DataStore};
use recommender_service::services::ModelArtifacts;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env().expect("Failed to load config");
    let ecosystem: Ecosystem = config
        .service
        .ecosystem
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    info!(
        "Starting {} for ecosystem {} ({} storage)",
        config.service.service_name,
        ecosystem.as_str(),
        config.storage.backend
    );

    let store: Box<dyn DataStore> = match config.storage.backend.as_str() {
        "s3" => Box::new(
            S3DataStore::new(
                config.storage.s3_bucket.clone(),
                config.storage.s3_region.clone(),
            )
            .await,
        ),
        "local" => Box::new(LocalDataStore::new(config.storage.local_data_dir.clone())),
        other => anyhow::bail!("unknown storage backend {:?}", other),
    };

    // A broken model is fatal: fail fast instead of serving degraded.
    let artifacts = ModelArtifacts::load(
        store.as_ref(),
        &config.paths,
        config.scoring.num_latent_factors,
    )
    .await
    .context("model artifact load failed")?;

    let recommender = Arc::new(PmfRecommender::new(
        artifacts,
        &config.scoring,
        ecosystem.as_str().to_string(),
    ));

    info!("Recommender loaded, serving line-delimited JSON on stdin");

    serve(recommender).await
}

/// One JSON request per stdin line, one JSON response per stdout line.
/// Malformed lines are reported and skipped; a bad request never stops the
/// loop.
async fn serve(recommender: Arc<PmfRecommender>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let correlation_id = Uuid::new_v4();
        let request: RecommendRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(%correlation_id, error = %e, "Skipping malformed request line");
                continue;
            }
        };

        info!(
            %correlation_id,
            stack_size = request.package_list.len(),
            "Handling recommendation request"
        );

        // CPU-bound scoring; keep it off the IO driver thread.
        let worker = Arc::clone(&recommender);
        let response = tokio::task::spawn_blocking(move || {
            worker.predict(&request.package_list, request.comp_package_count_threshold)
        })
        .await
        .context("prediction task panicked")?;

        match serde_json::to_string(&response) {
            Ok(payload) => {
                stdout.write_all(payload.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Err(e) => error!(%correlation_id, error = %e, "Failed to serialize response"),
        }
    }

    Ok(())
}
