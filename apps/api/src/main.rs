mod access;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod form;
mod guard;
mod layout;
mod models;
mod portfolio;
mod render;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::access::{AccessGate, MockPaymentProcessor};
use crate::auth::JwtAuthProvider;
use crate::config::Config;
use crate::db::create_pool;
use crate::form::TemplateBioGenerator;
use crate::guard::InFlight;
use crate::render::RenderContext;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{
    AccessStore, HandoffStore, MemoryHandoffStore, MemoryStore, ModuleStore, PgStore,
    PortfolioStore, RedisHandoffStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    // Record store: PostgreSQL when configured, memory otherwise
    let (portfolios, modules, access) = match &config.database_url {
        Some(url) => record_ports(Arc::new(PgStore::new(create_pool(url).await?))),
        None => {
            info!("DATABASE_URL not set, using in-memory store with default modules");
            record_ports(Arc::new(MemoryStore::with_default_modules()))
        }
    };

    // Session handoff: Redis when configured
    let handoff_ttl = Duration::from_secs(config.handoff_ttl_secs);
    let handoff: Arc<dyn HandoffStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisHandoffStore::new(
            redis::Client::open(url.as_str())?,
            handoff_ttl,
        )),
        None => {
            info!("REDIS_URL not set, using in-memory handoff store");
            Arc::new(MemoryHandoffStore::new(handoff_ttl))
        }
    };

    let state = AppState {
        portfolios,
        handoff,
        gate: AccessGate::new(modules, access, Arc::new(MockPaymentProcessor)),
        auth: Arc::new(JwtAuthProvider::new(&config.auth_jwt_secret)),
        bio: Arc::new(TemplateBioGenerator::new(Duration::from_millis(
            config.bio_latency_ms,
        ))),
        in_flight: InFlight::new(),
        render_ctx: RenderContext {
            public_base_url: config.public_base_url.clone(),
        },
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

type RecordPorts = (
    Arc<dyn PortfolioStore>,
    Arc<dyn ModuleStore>,
    Arc<dyn AccessStore>,
);

/// One adapter behind all three record-store ports.
fn record_ports<S>(store: Arc<S>) -> RecordPorts
where
    S: PortfolioStore + ModuleStore + AccessStore + 'static,
{
    (store.clone(), store.clone(), store)
}
