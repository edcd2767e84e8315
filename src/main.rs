//! Phishing URL detection server
//!
//! Startup order: logging, configuration, result store, model artifacts,
//! retriever, pipeline, HTTP listener. A failure before the listener binds
//! aborts the process; the service never starts half-initialized.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use qshing_server::api::{AppState, create_router};
use qshing_server::config::ServiceConfig;
use qshing_server::pipeline::DecisionPipeline;
use qshing_server::retriever::{ChromiumLauncher, PageRetriever};
use qshing_server::runtime::TokioSleeper;
use qshing_server::scorer::OnnxScorer;
use qshing_server::store::{MemoryCacheTier, ResultStore};
use qshing_server::tokenizer::{ContentEncoder, HfSubwordTokenizer};
use qshing_server::utils::constants::CACHE_SWEEP_INTERVAL_SECS;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qshing_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Phishing detection server starting");

    let cache = Arc::new(MemoryCacheTier::new());
    let store = ResultStore::connect(&config.store, cache.clone())
        .await
        .context("Failed to open result store")?;

    let scorer = OnnxScorer::load(&config.model.model_path, config.model.probability_output.clone())
        .context("Failed to load scoring model")?;
    let subword = HfSubwordTokenizer::from_file(&config.model.tokenizer_path, config.pipeline.max_length)
        .context("Failed to load content tokenizer")?;

    let sleeper = Arc::new(TokioSleeper);
    let retriever = PageRetriever::new(
        Arc::new(ChromiumLauncher::new(&config.retriever)),
        sleeper.clone(),
        config.retriever.clone(),
    );

    let pipeline = DecisionPipeline::new(
        config.pipeline.clone(),
        store.clone(),
        retriever,
        ContentEncoder::new(Arc::new(subword)),
        Arc::new(scorer),
        sleeper,
    );

    let sweep = cache.start_sweep_task(Duration::from_secs(CACHE_SWEEP_INTERVAL_SECS));

    let state = AppState::new(pipeline, config.server.analyze_deadline());
    let app = create_router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweep.abort();
    store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
