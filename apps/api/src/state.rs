use crate::config::Config;
use crate::tasks::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Task submission and status queries; the worker pool behind it owns
    /// all heavy work.
    pub orchestrator: Orchestrator,
    pub config: Config,
}
