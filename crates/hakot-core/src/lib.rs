//! Hakot Core - Subscription and invoice lifecycle engine
//!
//! Core billing lifecycle logic: status normalization over legacy payload
//! shapes, invoice evaluation (due dates, late fees), transition validation,
//! user-facing action resolution, and payment webhook handling.
//!
//! # Example
//!
//! ```rust,ignore
//! use hakot_core::{normalize_subscription_status, resolve_actions, InvoiceEngine, BillingPolicy};
//!
//! let normalized = normalize_subscription_status(&raw_payload);
//! let engine = InvoiceEngine::new(BillingPolicy::default());
//! let view = engine.evaluate(&invoice, Utc::now());
//! let actions = resolve_actions(&normalized, Some(&view));
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod invoice;
pub mod normalize;
pub mod service;
pub mod transition;
pub mod webhook;

pub use actions::resolve_actions;
pub use config::BillingPolicy;
pub use error::CoreError;
pub use invoice::InvoiceEngine;
pub use normalize::{normalize_invoice_status, normalize_subscription_status, NormalizedStatus};
pub use service::{ConfirmPayment, LifecycleService, PaymentOutcome};
pub use transition::{validate_transition, TransitionCheck};
pub use webhook::{GatewayEvent, GatewayEventType, PaymentEventData, WebhookHandler};
