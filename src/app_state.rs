//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::ConnectionRegistry;
use crate::service::TagService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection registry for the realtime relay.
    pub registry: Arc<ConnectionRegistry>,
    /// Tag name enrichment service.
    pub tags: Arc<TagService>,
    /// Shared secret for the admin endpoints; `None` disables them.
    pub admin_token: Option<String>,
}
