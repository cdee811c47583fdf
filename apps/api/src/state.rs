use std::sync::Arc;

use crate::access::AccessGate;
use crate::auth::AuthProvider;
use crate::config::Config;
use crate::form::BioGenerator;
use crate::guard::InFlight;
use crate::render::RenderContext;
use crate::store::{HandoffStore, PortfolioStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub portfolios: Arc<dyn PortfolioStore>,
    /// Anonymous drafts, keyed by opaque token, with a TTL.
    pub handoff: Arc<dyn HandoffStore>,
    pub gate: AccessGate,
    pub auth: Arc<dyn AuthProvider>,
    pub bio: Arc<dyn BioGenerator>,
    /// One export per document and one submission per user or draft at a time.
    pub in_flight: InFlight,
    pub render_ctx: RenderContext,
    pub config: Config,
}
