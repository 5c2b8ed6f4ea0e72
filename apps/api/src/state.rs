use std::sync::Arc;

use crate::backend::ResumeBackend;
use crate::config::Config;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// In-memory form sessions. Durable storage lives behind `backend`.
    pub sessions: SessionStore,
    /// Pluggable resume backend. Default: `HttpBackend`; tests swap in a mock.
    pub backend: Arc<dyn ResumeBackend>,
    pub config: Config,
}
