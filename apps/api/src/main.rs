mod client;
mod config;
mod corpus;
mod errors;
mod llm_client;
mod matching;
mod routes;
mod state;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::JsonFileCorpus;
use crate::llm_client::LlmClient;
use crate::matching::explain::LlmExplainer;
use crate::matching::pipeline::MatchContext;
use crate::matching::semantic::HashEmbeddingScorer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tasks::{worker::spawn_workers, Orchestrator};

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobfit API v{}", env!("CARGO_PKG_VERSION"));

    // Load the job corpus snapshot
    let corpus = Arc::new(JsonFileCorpus::load(&config.jobs_file)?);

    // Initialize LLM client (explanation generation only)
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Scoring collaborators: deterministic hash-embedding scorer by
    // default; swap the trait objects to plug in external models.
    let ctx = Arc::new(MatchContext {
        corpus,
        semantic: Arc::new(HashEmbeddingScorer),
        explainer: Arc::new(LlmExplainer::new(llm)),
    });

    // Task orchestrator, worker pool and retention sweeper
    let (orchestrator, work_queue) = Orchestrator::new();
    let workers = spawn_workers(
        config.worker_count,
        work_queue,
        orchestrator.store().clone(),
        ctx,
    );
    info!("Worker pool started with {} workers", workers.len());

    let _sweeper = orchestrator.spawn_retention_sweeper(
        Duration::from_secs(config.task_retention_secs),
        RETENTION_SWEEP_INTERVAL,
    );

    // Build app state
    let state = AppState {
        orchestrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
