//! PostgreSQL repository implementations

mod invoice;
mod payment;
mod reminder;
mod subscription;

pub use invoice::PgInvoiceRepository;
pub use payment::PgPaymentRepository;
pub use reminder::PgReminderRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub invoices: PgInvoiceRepository,
    pub payments: PgPaymentRepository,
    pub reminders: PgReminderRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            invoices: PgInvoiceRepository::new(pool.clone()),
            payments: PgPaymentRepository::new(pool.clone()),
            reminders: PgReminderRepository::new(pool),
        }
    }
}
