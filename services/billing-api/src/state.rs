//! Application state for the Billing API service.

use std::sync::Arc;

use hakot_client::CachedBillingClient;
use hakot_core::{LifecycleService, WebhookHandler};
use hakot_db::{DbPool, Repositories};
use hakot_reminders::ReminderScheduler;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle service (transitions, payments, invoice evaluation)
    pub lifecycle: Arc<LifecycleService>,
    /// Reminder scheduler
    pub scheduler: Arc<ReminderScheduler>,
    /// Gateway webhook verification
    pub webhook: WebhookHandler,
    /// Cached upstream billing source
    pub billing_source: CachedBillingClient,
    /// Database repositories (for direct access)
    pub repos: Repositories,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
