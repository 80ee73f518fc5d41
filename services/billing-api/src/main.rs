//! Hakot Billing API
//!
//! Billing lifecycle service for the waste-collection subscription app.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/billing/status` - Normalized subscription status
//! - `GET /api/v1/billing/invoice` - Evaluated current invoice
//! - `GET /api/v1/billing/actions` - Resolved action list
//! - `POST /api/v1/billing/reminders/apply` - Rebuild the reminder schedule
//! - `POST /api/v1/billing/reminders/snooze` - Add a snooze reminder
//! - `POST /api/v1/billing/reminders/cancel` - Cancel all reminders
//! - `POST /webhooks/payment` - Gateway payment webhook
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use hakot_client::{BillingSourceClient, CacheConfig, CachedBillingClient, ClientConfig};
use hakot_core::{LifecycleService, WebhookHandler};
use hakot_db::Repositories;
use hakot_reminders::{ReminderScheduler, SchedulerConfig};

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("billing_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hakot Billing API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool and repositories
    let pool = hakot_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");
    let repos = Repositories::new(pool.clone());

    // Lifecycle service over the repositories
    let lifecycle = Arc::new(LifecycleService::new(
        Arc::new(repos.subscriptions.clone()),
        Arc::new(repos.invoices.clone()),
        Arc::new(repos.payments.clone()),
        config.policy,
    ));

    // Reminder scheduler; the push backend is wired in from its own crate
    // in deployment builds, tests use fakes.
    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::new(repos.reminders.clone()),
        build_notifier(),
        SchedulerConfig::default(),
    ));

    // Cached upstream billing source
    let mut client_config = ClientConfig::new(config.billing_source_url.clone())?
        .with_timeout(config.request_timeout);
    if let Some(token) = &config.billing_source_token {
        client_config = client_config.with_api_token(token.clone());
    }
    let source = BillingSourceClient::new(client_config)?;
    let billing_source = CachedBillingClient::new(Arc::new(source), CacheConfig::default());

    let state = AppState {
        lifecycle,
        scheduler,
        webhook: WebhookHandler::new(config.webhook_secret.clone()),
        billing_source,
        repos,
        pool,
        config: Arc::new(config.clone()),
    };

    // Restart recovery: bring schedule rows and backend notifications back
    // into agreement with the current plans. Runs in the background so a
    // slow pass never delays serving.
    tokio::spawn(reconcile_reminders(state.clone()));

    // Build HTTP router and serve
    let app = build_router(state, metrics_handle);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 billing routes
    let api_v1 = Router::new()
        .route("/billing/status", get(handlers::get_status))
        .route("/billing/invoice", get(handlers::get_invoice))
        .route("/billing/actions", get(handlers::get_actions))
        .route("/billing/reminders/apply", post(handlers::apply_reminders))
        .route("/billing/reminders/snooze", post(handlers::snooze_reminders))
        .route("/billing/reminders/cancel", post(handlers::cancel_reminders));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/payment", post(handlers::payment_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

/// Notification backend for scheduled reminders.
///
/// TODO(push): swap in the device push backend once its delivery queue
/// lands; until then scheduled reminders are persisted but not delivered.
fn build_notifier() -> Arc<dyn hakot_reminders::Notifier> {
    Arc::new(LogNotifier)
}

/// Notifier that records schedules in the log only.
struct LogNotifier;

#[async_trait::async_trait]
impl hakot_reminders::Notifier for LogNotifier {
    async fn schedule_at(
        &self,
        at: chrono::DateTime<chrono::Utc>,
        payload: hakot_reminders::ReminderPayload,
    ) -> Result<hakot_reminders::NotificationId, hakot_reminders::NotifyError> {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            notification_id = %id,
            invoice_id = %payload.invoice_id,
            offset = %payload.offset_key,
            at = %at,
            "reminder scheduled"
        );
        Ok(hakot_reminders::NotificationId(id))
    }

    async fn cancel(
        &self,
        id: &hakot_reminders::NotificationId,
    ) -> Result<(), hakot_reminders::NotifyError> {
        tracing::info!(notification_id = %id, "reminder cancelled");
        Ok(())
    }

    async fn scheduled_ids(
        &self,
    ) -> Result<Vec<hakot_reminders::NotificationId>, hakot_reminders::NotifyError> {
        Ok(Vec::new())
    }
}

/// Walk every invoice that still has schedule rows and reconcile it.
///
/// A restart loses in-flight apply calls and the device can shed
/// notifications on its own, so this runs once on startup. Per-invoice
/// failures are logged and skipped.
async fn reconcile_reminders(state: AppState) {
    use hakot_db::ReminderRepository;
    use hakot_types::InvoiceId;

    let ids = match state.repos.reminders.distinct_invoice_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "reminder reconcile pass could not list invoices");
            return;
        }
    };

    let mut scheduled = 0;
    let mut cancelled = 0;
    let mut repaired = 0;
    for id in ids {
        let invoice_id = InvoiceId(id);
        let now = chrono::Utc::now();
        match state.lifecycle.evaluate_invoice(invoice_id, now).await {
            Ok(Some(view)) => match state.scheduler.reconcile(&view, now).await {
                Ok(report) => {
                    scheduled += report.scheduled;
                    cancelled += report.cancelled;
                    repaired += report.repaired;
                }
                Err(e) => {
                    tracing::warn!(invoice_id = %invoice_id, error = %e, "reminder reconcile failed");
                }
            },
            Ok(None) => {
                // Schedule rows for an invoice that no longer exists.
                if let Err(e) = state.scheduler.cancel_all(invoice_id).await {
                    tracing::warn!(invoice_id = %invoice_id, error = %e, "failed to drop orphaned reminders");
                }
            }
            Err(e) => {
                tracing::warn!(invoice_id = %invoice_id, error = %e, "failed to evaluate invoice for reconcile");
            }
        }
    }
    tracing::info!(scheduled, cancelled, repaired, "reminder reconcile pass complete");
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets sized for billing operations
    let billing_latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            billing_latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("billing_operation_duration_seconds".to_string()),
            billing_latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "billing_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_counter!(
        "hakot_reminders_scheduled_total",
        "Total reminders scheduled"
    );
    metrics::describe_counter!(
        "hakot_reminders_cancelled_total",
        "Total reminders cancelled"
    );
    metrics::describe_counter!(
        "hakot_client_stale_served_total",
        "Status lookups served from last-known-good cache"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    metrics::describe_histogram!(
        "billing_operation_duration_seconds",
        "Billing operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
