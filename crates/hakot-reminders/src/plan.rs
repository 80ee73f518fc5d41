//! Reminder planning.
//!
//! The plan for an invoice is a pure function of its due date: a week
//! before, a day before, the local morning of the due day, and an overdue
//! notice a few days after. Entries already in the past are dropped, and a
//! paid invoice plans nothing.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use hakot_types::{InvoiceId, InvoiceView};

use crate::config::SchedulerConfig;

/// Where in the invoice timeline a reminder sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOffset {
    WeekBefore,
    DayBefore,
    DueDay,
    OverdueNotice,
    Snooze,
}

impl ReminderOffset {
    /// Stable key persisted alongside each scheduled reminder.
    pub fn key(self) -> &'static str {
        match self {
            Self::WeekBefore => "week_before",
            Self::DayBefore => "day_before",
            Self::DueDay => "due_day",
            Self::OverdueNotice => "overdue_notice",
            Self::Snooze => "snooze",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "week_before" => Some(Self::WeekBefore),
            "day_before" => Some(Self::DayBefore),
            "due_day" => Some(Self::DueDay),
            "overdue_notice" => Some(Self::OverdueNotice),
            "snooze" => Some(Self::Snooze),
            _ => None,
        }
    }
}

/// A reminder the scheduler intends to have live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub invoice_id: InvoiceId,
    pub offset: ReminderOffset,
    pub scheduled_at: DateTime<Utc>,
}

/// Compute the reminder plan for an invoice as of `now`.
///
/// Candidates are 7 days and 1 day before the due date (at the due date's
/// own time of day), the morning of the due day, and an overdue notice
/// `overdue_notice_days` after it, both at `notify_hour` local time. Only
/// candidates strictly after `now` survive; a paid invoice yields an empty
/// plan.
pub fn plan_reminders(
    view: &InvoiceView,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
) -> Vec<PlannedReminder> {
    if view.is_paid {
        return Vec::new();
    }

    let candidates = [
        (ReminderOffset::WeekBefore, view.due_date - Duration::days(7)),
        (ReminderOffset::DayBefore, view.due_date - Duration::days(1)),
        (ReminderOffset::DueDay, at_local_hour(view.due_date, config)),
        (
            ReminderOffset::OverdueNotice,
            at_local_hour(
                view.due_date + Duration::days(config.overdue_notice_days),
                config,
            ),
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, at)| *at > now)
        .map(|(offset, scheduled_at)| PlannedReminder {
            invoice_id: view.invoice_id,
            offset,
            scheduled_at,
        })
        .collect()
}

/// Pin a timestamp to `notify_hour` local time on its own local calendar day.
pub(crate) fn at_local_hour(at: DateTime<Utc>, config: &SchedulerConfig) -> DateTime<Utc> {
    let local = at.with_timezone(&config.local_offset);
    let morning = NaiveTime::from_hms_opt(config.notify_hour, 0, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    match local.date_naive().and_time(morning).and_local_timezone(config.local_offset) {
        chrono::LocalResult::Single(t) => t.with_timezone(&Utc),
        // Fixed offsets are never ambiguous; keep the original instant if
        // chrono ever disagrees.
        _ => at,
    }
}
