//! NetSeg API - Network Segment Service
//!
//! HTTP service managing network segment records: the binding of a network
//! to a physical network, a segmentation type and a segmentation id.

mod config;
mod dto;
mod handlers;
mod routes;

use anyhow::Result;
use netseg_domain::SegmentManager;
use netseg_memory::InMemorySegmentStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ApiConfig, LogFormat};

/// Segment manager backed by the in-memory store
pub type Segments = SegmentManager<InMemorySegmentStore, InMemorySegmentStore>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub segments: Arc<Segments>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// State over a fresh store, which serves both storage and markers
    pub fn new(config: ApiConfig) -> Self {
        let store = InMemorySegmentStore::new();
        Self {
            segments: Arc::new(SegmentManager::with_store(store.clone(), store)),
            config: Arc::new(config),
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    init_tracing(config.log_format);

    info!(
        allow_sorting = config.allow_sorting,
        allow_pagination = config.allow_pagination,
        pagination_max_limit = ?config.pagination_max_limit,
        "Starting NetSeg API"
    );

    let addr = config.bind_addr();

    // Create shared application state
    let state = AppState::new(config);

    // Build HTTP router
    let app = routes::create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
