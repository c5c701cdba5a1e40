//! Shared application state.

use std::sync::{Arc, Mutex};

use epri_core::clock::Clock;
use epri_core::error::DomainError;
use epri_core::repository::VisitRepository;
use epri_core::rng::SessionEntropy;

use crate::error::ApiError;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for visit and aggregate timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Entropy source for session ids.
    pub entropy: Arc<Mutex<dyn SessionEntropy + Send>>,
    /// Visit log and site statistics store.
    pub visit_repository: Arc<dyn VisitRepository>,
    /// Bearer token for admin endpoints. `None` rejects every admin request.
    pub admin_token: Option<Arc<str>>,
    /// Whether error responses include diagnostic detail.
    pub expose_error_detail: bool,
}

impl AppState {
    /// Create new application state with admin endpoints disabled and error
    /// detail hidden.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        entropy: Arc<Mutex<dyn SessionEntropy + Send>>,
        visit_repository: Arc<dyn VisitRepository>,
    ) -> Self {
        Self {
            clock,
            entropy,
            visit_repository,
            admin_token: None,
            expose_error_detail: false,
        }
    }

    /// Sets the admin bearer token.
    #[must_use]
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.map(Arc::from);
        self
    }

    /// Sets whether error responses include diagnostic detail.
    #[must_use]
    pub fn with_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    /// Returns a mapper from `DomainError` to `ApiError` that uses
    /// `failure_message` for server-side failures.
    pub fn fail(&self, failure_message: &'static str) -> impl Fn(DomainError) -> ApiError + use<> {
        let expose = self.expose_error_detail;
        move |err| ApiError::from_domain(err, failure_message, expose)
    }
}
