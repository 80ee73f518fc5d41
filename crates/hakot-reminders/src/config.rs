use chrono::FixedOffset;

/// Tuning knobs for reminder planning.
///
/// Due-day and overdue notices fire at a fixed hour in the subscriber's
/// local timezone; the default offset is +08:00 (Philippine Standard Time,
/// which has no daylight saving).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub local_offset: FixedOffset,
    pub notify_hour: u32,
    pub overdue_notice_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            local_offset: FixedOffset::east_opt(8 * 3600).unwrap(),
            notify_hour: 9,
            overdue_notice_days: 3,
        }
    }
}

impl SchedulerConfig {
    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn with_notify_hour(mut self, hour: u32) -> Self {
        self.notify_hour = hour.min(23);
        self
    }

    pub fn with_overdue_notice_days(mut self, days: i64) -> Self {
        self.overdue_notice_days = days.max(0);
        self
    }
}
