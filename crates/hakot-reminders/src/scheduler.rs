//! Reminder scheduler.
//!
//! Bridges the pure reminder plan to two stateful surfaces: the
//! `reminder_schedule` table and the device notification backend. All
//! operations on one invoice serialize through a keyed async lock so a
//! payment webhook and a reconcile pass cannot interleave their
//! cancel-then-schedule sequences.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use hakot_db::{ReminderRepository, ReminderRow};
use hakot_types::{InvoiceId, InvoiceView};

use crate::config::SchedulerConfig;
use crate::error::{ReminderError, ReminderResult};
use crate::notify::{NotificationId, Notifier, ReminderPayload};
use crate::plan::{plan_reminders, PlannedReminder, ReminderOffset};

/// Outcome of a [`ReminderScheduler::reconcile`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Plan entries that had no row and were newly scheduled
    pub scheduled: usize,
    /// Rows with no counterpart in the plan, cancelled and deleted
    pub cancelled: usize,
    /// Rows whose backend notification had vanished and was re-created
    pub repaired: usize,
}

pub struct ReminderScheduler {
    repo: Arc<dyn ReminderRepository>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ReminderScheduler {
    pub fn new(
        repo: Arc<dyn ReminderRepository>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            repo,
            notifier,
            config,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, invoice_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(invoice_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Replace the schedule for an invoice with its current plan.
    ///
    /// Cancels everything on record first, then schedules the plan as of
    /// `now`. Calling this twice in a row leaves the same schedule, so it is
    /// safe to run on every invoice refresh. Returns how many reminders are
    /// now scheduled.
    pub async fn apply(&self, view: &InvoiceView, now: DateTime<Utc>) -> ReminderResult<usize> {
        let lock = self.lock_for(view.invoice_id.0);
        let _guard = lock.lock().await;

        self.clear_locked(view.invoice_id).await?;

        let plan = plan_reminders(view, now, &self.config);
        let mut scheduled = 0;
        for entry in &plan {
            if self.schedule_one(view, entry).await {
                scheduled += 1;
            }
        }

        debug!(
            invoice_id = %view.invoice_id,
            scheduled,
            planned = plan.len(),
            "applied reminder schedule"
        );
        Ok(scheduled)
    }

    /// Add one extra reminder `days` from now without touching the rest of
    /// the schedule. Returns when it will fire.
    pub async fn snooze(
        &self,
        view: &InvoiceView,
        days: i64,
        now: DateTime<Utc>,
    ) -> ReminderResult<DateTime<Utc>> {
        if days < 1 {
            return Err(ReminderError::InvalidSnooze(format!(
                "snooze must be at least one day, got {days}"
            )));
        }
        if view.is_paid {
            return Err(ReminderError::InvalidSnooze(
                "invoice is already paid".to_string(),
            ));
        }

        let lock = self.lock_for(view.invoice_id.0);
        let _guard = lock.lock().await;

        // The subscriber asked for "remind me in N days", so the reminder
        // keeps the time of day the request was made at.
        let at = now + Duration::days(days);
        let entry = PlannedReminder {
            invoice_id: view.invoice_id,
            offset: ReminderOffset::Snooze,
            scheduled_at: at,
        };
        let id = self
            .notifier
            .schedule_at(at, payload_for(view, &entry))
            .await?;
        self.repo.insert(row_for(&entry, &id)).await?;

        counter!("hakot_reminders_scheduled_total").increment(1);
        Ok(at)
    }

    /// Cancel every reminder for an invoice. Returns how many rows went.
    pub async fn cancel_all(&self, invoice_id: InvoiceId) -> ReminderResult<u64> {
        let lock = self.lock_for(invoice_id.0);
        let deleted = {
            let _guard = lock.lock().await;
            self.clear_locked(invoice_id).await?
        };
        drop(lock);
        // Once nobody else holds the Arc, only the map's copy is left and
        // the entry can go with the schedule. remove_if runs under the
        // shard lock, so a concurrent lock_for either clones first (count
        // above one, no removal) or re-creates the entry afterwards.
        self.locks
            .remove_if(&invoice_id.0, |_, l| Arc::strong_count(l) == 1);
        Ok(deleted)
    }

    /// Bring schedule rows, backend notifications, and the current plan back
    /// into agreement.
    ///
    /// Rows with no plan counterpart are cancelled, plan entries with no row
    /// are scheduled, and rows whose backend notification has disappeared
    /// (app reinstall, permission flip) are re-created. Snooze rows are
    /// user-requested and survive as long as they are still in the future.
    pub async fn reconcile(
        &self,
        view: &InvoiceView,
        now: DateTime<Utc>,
    ) -> ReminderResult<ReconcileReport> {
        let lock = self.lock_for(view.invoice_id.0);
        let _guard = lock.lock().await;

        let plan = plan_reminders(view, now, &self.config);
        let desired: HashMap<&str, &PlannedReminder> =
            plan.iter().map(|p| (p.offset.key(), p)).collect();
        let rows = self.repo.find_by_invoice_id(view.invoice_id.0).await?;
        let live: HashSet<String> = self
            .notifier
            .scheduled_ids()
            .await?
            .into_iter()
            .map(|id| id.0)
            .collect();

        let mut report = ReconcileReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for row in rows {
            let is_snooze = row.offset_key == ReminderOffset::Snooze.key();
            let wanted = if is_snooze {
                row.scheduled_at > now
            } else {
                desired.contains_key(row.offset_key.as_str())
            };

            if !wanted {
                self.cancel_row(&row).await?;
                report.cancelled += 1;
                continue;
            }
            seen.insert(row.offset_key.clone());

            if !live.contains(&row.notification_id) {
                // The backend lost this one; give it a fresh notification.
                self.repo
                    .delete_by_notification_id(&row.notification_id)
                    .await?;
                let entry = PlannedReminder {
                    invoice_id: view.invoice_id,
                    offset: ReminderOffset::from_key(&row.offset_key)
                        .unwrap_or(ReminderOffset::Snooze),
                    scheduled_at: row.scheduled_at,
                };
                if self.schedule_one(view, &entry).await {
                    report.repaired += 1;
                }
            }
        }

        for entry in &plan {
            if seen.contains(entry.offset.key()) {
                continue;
            }
            if self.schedule_one(view, entry).await {
                report.scheduled += 1;
            }
        }

        debug!(
            invoice_id = %view.invoice_id,
            scheduled = report.scheduled,
            cancelled = report.cancelled,
            repaired = report.repaired,
            "reconciled reminder schedule"
        );
        Ok(report)
    }

    /// Cancel notifications and delete rows for one invoice. Caller holds
    /// the invoice lock.
    async fn clear_locked(&self, invoice_id: InvoiceId) -> ReminderResult<u64> {
        let rows = self.repo.find_by_invoice_id(invoice_id.0).await?;
        for row in &rows {
            if let Err(e) = self
                .notifier
                .cancel(&NotificationId(row.notification_id.clone()))
                .await
            {
                // Worst case the stale notification fires once; the row is
                // gone either way.
                warn!(
                    invoice_id = %invoice_id,
                    notification_id = %row.notification_id,
                    error = %e,
                    "failed to cancel notification"
                );
            }
        }
        let deleted = self.repo.delete_for_invoice(invoice_id.0).await?;
        if deleted > 0 {
            counter!("hakot_reminders_cancelled_total").increment(deleted);
        }
        Ok(deleted)
    }

    async fn cancel_row(&self, row: &ReminderRow) -> ReminderResult<()> {
        if let Err(e) = self
            .notifier
            .cancel(&NotificationId(row.notification_id.clone()))
            .await
        {
            warn!(
                invoice_id = %row.invoice_id,
                notification_id = %row.notification_id,
                error = %e,
                "failed to cancel notification"
            );
        }
        self.repo
            .delete_by_notification_id(&row.notification_id)
            .await?;
        counter!("hakot_reminders_cancelled_total").increment(1);
        Ok(())
    }

    /// Schedule one plan entry and persist its row. A backend refusal is
    /// logged and skipped so one bad entry cannot block the rest.
    async fn schedule_one(&self, view: &InvoiceView, entry: &PlannedReminder) -> bool {
        let id = match self
            .notifier
            .schedule_at(entry.scheduled_at, payload_for(view, entry))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    invoice_id = %entry.invoice_id,
                    offset = entry.offset.key(),
                    error = %e,
                    "failed to schedule reminder"
                );
                counter!("hakot_reminders_schedule_failures_total").increment(1);
                return false;
            }
        };
        match self.repo.insert(row_for(entry, &id)).await {
            Ok(()) => {
                counter!("hakot_reminders_scheduled_total").increment(1);
                true
            }
            Err(e) => {
                warn!(
                    invoice_id = %entry.invoice_id,
                    offset = entry.offset.key(),
                    error = %e,
                    "failed to persist reminder row"
                );
                let _ = self.notifier.cancel(&id).await;
                false
            }
        }
    }
}

fn payload_for(view: &InvoiceView, entry: &PlannedReminder) -> ReminderPayload {
    ReminderPayload {
        invoice_id: entry.invoice_id,
        offset_key: entry.offset.key().to_string(),
        total_due_centavos: view.total_due_centavos,
        due_date: view.due_date,
    }
}

fn row_for(entry: &PlannedReminder, id: &NotificationId) -> ReminderRow {
    ReminderRow {
        invoice_id: entry.invoice_id.0,
        offset_key: entry.offset.key().to_string(),
        scheduled_at: entry.scheduled_at,
        notification_id: id.0.clone(),
    }
}
