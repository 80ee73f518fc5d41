//! Billing policy configuration

/// Late-fee and grace-period policy for invoice evaluation
///
/// The late fee is a flat one-time amount, not per-day. It applies the first
/// time an invoice is observed overdue beyond the grace period.
#[derive(Debug, Clone, Copy)]
pub struct BillingPolicy {
    /// Days after the due date before the late fee applies
    pub grace_days: i64,
    /// Flat late fee in centavos
    pub flat_late_fee_centavos: i64,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            grace_days: 7,
            flat_late_fee_centavos: 5_000, // P50.00
        }
    }
}

impl BillingPolicy {
    /// Create a policy with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grace period in days
    #[must_use]
    pub fn with_grace_days(mut self, days: i64) -> Self {
        self.grace_days = days;
        self
    }

    /// Set the flat late fee in centavos
    #[must_use]
    pub fn with_flat_late_fee(mut self, centavos: i64) -> Self {
        self.flat_late_fee_centavos = centavos;
        self
    }
}
