//! Payment reminder planning and scheduling.
//!
//! [`plan_reminders`] derives the reminder timeline for an invoice from its
//! due date. [`ReminderScheduler`] reconciles that timeline against the
//! persisted schedule and a device-notification backend, keeping the two in
//! sync as invoices are created, paid, or snoozed.

pub mod config;
pub mod error;
pub mod notify;
pub mod plan;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::{ReminderError, ReminderResult};
pub use notify::{NotificationId, Notifier, NotifyError, ReminderPayload};
pub use plan::{plan_reminders, PlannedReminder, ReminderOffset};
pub use scheduler::{ReconcileReport, ReminderScheduler};
