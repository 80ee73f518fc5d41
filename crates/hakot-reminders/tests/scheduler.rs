//! Scheduler behavior against in-memory notifier and repository fakes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use hakot_db::{DbResult, ReminderRepository, ReminderRow};
use hakot_reminders::{
    NotificationId, Notifier, NotifyError, ReminderPayload, ReminderScheduler, SchedulerConfig,
};
use hakot_types::{InvoiceId, InvoiceStatus, InvoiceView};

#[derive(Default)]
struct MockNotifier {
    pending: DashMap<String, (DateTime<Utc>, ReminderPayload)>,
    next_id: AtomicU64,
    fail_next_schedule: AtomicBool,
}

impl MockNotifier {
    fn fail_next_schedule(&self) {
        self.fail_next_schedule.store(true, Ordering::SeqCst);
    }

    /// Drop a notification without telling anyone, as a reinstalled app
    /// would observe.
    fn forget(&self, id: &str) {
        self.pending.remove(id);
    }

    fn count(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: ReminderPayload,
    ) -> Result<NotificationId, NotifyError> {
        if self.fail_next_schedule.swap(false, Ordering::SeqCst) {
            return Err(NotifyError::PermissionDenied);
        }
        let id = format!("notif-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.pending.insert(id.clone(), (at, payload));
        Ok(NotificationId(id))
    }

    async fn cancel(&self, id: &NotificationId) -> Result<(), NotifyError> {
        self.pending.remove(&id.0);
        Ok(())
    }

    async fn scheduled_ids(&self) -> Result<Vec<NotificationId>, NotifyError> {
        Ok(self
            .pending
            .iter()
            .map(|e| NotificationId(e.key().clone()))
            .collect())
    }
}

#[derive(Default)]
struct MockReminderRepo {
    rows: DashMap<String, ReminderRow>,
}

impl MockReminderRepo {
    fn rows_for(&self, invoice_id: Uuid) -> Vec<ReminderRow> {
        self.rows
            .iter()
            .filter(|e| e.value().invoice_id == invoice_id)
            .map(|e| e.value().clone())
            .collect()
    }
}

#[async_trait]
impl ReminderRepository for MockReminderRepo {
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<ReminderRow>> {
        Ok(self.rows_for(invoice_id))
    }

    async fn insert(&self, row: ReminderRow) -> DbResult<()> {
        self.rows.insert(row.notification_id.clone(), row);
        Ok(())
    }

    async fn delete_for_invoice(&self, invoice_id: Uuid) -> DbResult<u64> {
        let ids: Vec<String> = self
            .rows
            .iter()
            .filter(|e| e.value().invoice_id == invoice_id)
            .map(|e| e.key().clone())
            .collect();
        for id in &ids {
            self.rows.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn delete_by_notification_id(&self, notification_id: &str) -> DbResult<()> {
        self.rows.remove(notification_id);
        Ok(())
    }

    async fn distinct_invoice_ids(&self) -> DbResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.rows.iter().map(|e| e.value().invoice_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

struct Fixture {
    scheduler: ReminderScheduler,
    notifier: Arc<MockNotifier>,
    repo: Arc<MockReminderRepo>,
}

fn fixture() -> Fixture {
    let notifier = Arc::new(MockNotifier::default());
    let repo = Arc::new(MockReminderRepo::default());
    let scheduler = ReminderScheduler::new(
        repo.clone(),
        notifier.clone(),
        SchedulerConfig::default(),
    );
    Fixture {
        scheduler,
        notifier,
        repo,
    }
}

fn unpaid_view(due_date: DateTime<Utc>) -> InvoiceView {
    InvoiceView {
        invoice_id: InvoiceId::new(),
        status: InvoiceStatus::Unpaid,
        is_paid: false,
        is_overdue: false,
        amount_centavos: 50_000,
        due_date,
        late_fee_centavos: 0,
        total_due_centavos: 50_000,
        days_until_due: 10,
        days_overdue: 0,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn apply_is_idempotent() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));

    let first = f.scheduler.apply(&view, now()).await.unwrap();
    let rows_after_first: Vec<String> = f
        .repo
        .rows_for(view.invoice_id.0)
        .into_iter()
        .map(|r| r.offset_key)
        .collect();

    let second = f.scheduler.apply(&view, now()).await.unwrap();
    let mut rows_after_second: Vec<String> = f
        .repo
        .rows_for(view.invoice_id.0)
        .into_iter()
        .map(|r| r.offset_key)
        .collect();

    assert_eq!(first, second);
    let mut expected = rows_after_first;
    expected.sort();
    rows_after_second.sort();
    assert_eq!(rows_after_second, expected);
    assert_eq!(f.notifier.count(), second);
}

#[tokio::test]
async fn apply_on_paid_invoice_clears_the_schedule() {
    let f = fixture();
    let mut view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();
    assert!(f.notifier.count() > 0);

    view.is_paid = true;
    view.status = InvoiceStatus::Paid;
    let scheduled = f.scheduler.apply(&view, now()).await.unwrap();

    assert_eq!(scheduled, 0);
    assert_eq!(f.notifier.count(), 0);
    assert!(f.repo.rows_for(view.invoice_id.0).is_empty());
}

#[tokio::test]
async fn snooze_adds_without_disturbing_the_plan() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();
    let before: Vec<ReminderRow> = f.repo.rows_for(view.invoice_id.0);

    // "Remind me in two days" means exactly that, not the next 09:00.
    let at = f.scheduler.snooze(&view, 2, now()).await.unwrap();
    assert_eq!(at, now() + Duration::days(2));

    let after = f.repo.rows_for(view.invoice_id.0);
    assert_eq!(after.len(), before.len() + 1);
    for row in &before {
        assert!(after
            .iter()
            .any(|r| r.notification_id == row.notification_id));
    }
    assert!(after.iter().any(|r| r.offset_key == "snooze"));
}

#[tokio::test]
async fn snooze_rejects_bad_input() {
    let f = fixture();
    let mut view = unpaid_view(now() + Duration::days(10));

    assert!(f.scheduler.snooze(&view, 0, now()).await.is_err());

    view.is_paid = true;
    view.status = InvoiceStatus::Paid;
    assert!(f.scheduler.snooze(&view, 3, now()).await.is_err());
}

#[tokio::test]
async fn cancel_all_empties_both_sides() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();
    f.scheduler.snooze(&view, 2, now()).await.unwrap();

    let deleted = f.scheduler.cancel_all(view.invoice_id).await.unwrap();

    assert!(deleted >= 2);
    assert_eq!(f.notifier.count(), 0);
    assert!(f.repo.rows_for(view.invoice_id.0).is_empty());
}

#[tokio::test]
async fn reconcile_repairs_a_lost_notification() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();

    let victim = f.repo.rows_for(view.invoice_id.0).pop().unwrap();
    f.notifier.forget(&victim.notification_id);

    let report = f.scheduler.reconcile(&view, now()).await.unwrap();

    assert_eq!(report.repaired, 1);
    assert_eq!(report.scheduled, 0);
    assert_eq!(report.cancelled, 0);
    let rows = f.repo.rows_for(view.invoice_id.0);
    assert!(rows
        .iter()
        .all(|r| r.notification_id != victim.notification_id));
    assert!(rows.iter().any(|r| r.offset_key == victim.offset_key));
}

#[tokio::test]
async fn reconcile_schedules_missing_and_cancels_stale_entries() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();
    let row_count = f.repo.rows_for(view.invoice_id.0).len();

    // Drop one row as if a previous run died mid-apply, and plant a snooze
    // row that has already fired.
    let dropped = f
        .repo
        .rows_for(view.invoice_id.0)
        .into_iter()
        .find(|r| r.offset_key == "day_before")
        .unwrap();
    f.repo
        .delete_by_notification_id(&dropped.notification_id)
        .await
        .unwrap();
    f.notifier.forget(&dropped.notification_id);
    f.repo
        .insert(ReminderRow {
            invoice_id: view.invoice_id.0,
            offset_key: "snooze".to_string(),
            scheduled_at: now() - Duration::days(30),
            notification_id: "stale-notif".to_string(),
        })
        .await
        .unwrap();

    let report = f.scheduler.reconcile(&view, now()).await.unwrap();

    assert_eq!(report.scheduled, 1);
    assert_eq!(report.cancelled, 1);
    let rows = f.repo.rows_for(view.invoice_id.0);
    assert_eq!(rows.len(), row_count);
    assert!(rows.iter().all(|r| r.notification_id != "stale-notif"));
}

#[tokio::test]
async fn reconcile_keeps_future_snoozes_and_drops_past_ones() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));
    f.scheduler.apply(&view, now()).await.unwrap();
    f.scheduler.snooze(&view, 2, now()).await.unwrap();

    // A snooze that has already fired should not survive reconcile.
    f.repo
        .insert(ReminderRow {
            invoice_id: view.invoice_id.0,
            offset_key: "snooze".to_string(),
            scheduled_at: now() - Duration::days(1),
            notification_id: "old-snooze".to_string(),
        })
        .await
        .unwrap();

    let report = f.scheduler.reconcile(&view, now()).await.unwrap();

    assert_eq!(report.cancelled, 1);
    let rows = f.repo.rows_for(view.invoice_id.0);
    assert!(rows.iter().all(|r| r.notification_id != "old-snooze"));
    assert!(rows
        .iter()
        .any(|r| r.offset_key == "snooze" && r.scheduled_at > now()));
}

#[tokio::test]
async fn one_backend_refusal_does_not_block_the_rest() {
    let f = fixture();
    let view = unpaid_view(now() + Duration::days(10));

    f.notifier.fail_next_schedule();
    let scheduled = f.scheduler.apply(&view, now()).await.unwrap();

    // All four candidates are in the future for a due date ten days out;
    // one refusal costs exactly one reminder.
    assert_eq!(scheduled, 3);
    assert_eq!(f.repo.rows_for(view.invoice_id.0).len(), 3);
}
