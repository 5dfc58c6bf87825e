//! # Application State
//!
//! Shared state for the Axum application: the repository, the engine
//! services wired over it, and the metrics aggregator that doubles as the
//! engine's verdict sink.

use std::sync::Arc;

use rto_engine::{
    DisputeManager, EventIngestor, LoggingSender, MemoryRepository, OrderLocks,
    PendingResolutionStore, ResolutionOrchestrator,
};
use rto_metrics::{AggregatorConfig, MetricsAggregator};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port to bind.
    pub port: u16,
    /// Rupee cost attributed to each prevented RTO in dashboards.
    pub rto_unit_cost: f64,
}

impl AppConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// - `PORT` — listen port (default 8080)
    /// - `RTO_UNIT_COST` — per-RTO cost estimate in rupees (default 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let rto_unit_cost = std::env::var("RTO_UNIT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|c: &f64| c.is_finite() && *c >= 0.0)
            .unwrap_or(defaults.rto_unit_cost);
        Self {
            port,
            rto_unit_cost,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            rto_unit_cost: AggregatorConfig::default().rto_unit_cost,
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: AppConfig,
    /// Courier event ingestion service.
    pub ingestor: Arc<EventIngestor>,
    /// Customer resolution orchestration.
    pub orchestrator: Arc<ResolutionOrchestrator>,
    /// Seller challenge workflow.
    pub disputes: Arc<DisputeManager>,
    /// Streaming read models.
    pub metrics: Arc<MetricsAggregator>,
}

impl AppState {
    /// Wire all services over a fresh in-memory repository.
    pub fn new(config: AppConfig) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let locks = Arc::new(OrderLocks::new());
        let pending = Arc::new(PendingResolutionStore::new());
        let metrics = Arc::new(MetricsAggregator::new(AggregatorConfig {
            rto_unit_cost: config.rto_unit_cost,
        }));

        let ingestor = Arc::new(EventIngestor::new(
            repo.clone(),
            locks.clone(),
            metrics.clone(),
            Arc::new(LoggingSender),
            pending.clone(),
        ));
        let orchestrator = Arc::new(ResolutionOrchestrator::new(
            repo.clone(),
            locks.clone(),
            pending,
        ));
        let disputes = Arc::new(DisputeManager::new(repo, locks, metrics.clone()));

        Self {
            config,
            ingestor,
            orchestrator,
            disputes,
            metrics,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
