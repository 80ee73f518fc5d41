//! Subscription status transition validation
//!
//! Encodes the legal transition graph as a fixed adjacency function. Every
//! component that writes a new status must call [`validate_transition`]
//! first and abort the write on an invalid result; the check itself has no
//! side effects.

use hakot_types::SubscriptionStatus;

/// Result of a transition check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCheck {
    /// Whether the edge exists in the graph
    pub is_valid: bool,
    /// Why the edge is rejected, when it is
    pub reason: Option<String>,
}

impl TransitionCheck {
    fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Validate a subscription status transition.
///
/// Cancelled and expired subscriptions re-enter only through a pending
/// state, never directly to active. Renewal or downgrade of an active
/// subscription re-enters a pending state.
pub fn validate_transition(
    from: SubscriptionStatus,
    to: SubscriptionStatus,
) -> TransitionCheck {
    use SubscriptionStatus as S;

    if from == to {
        return TransitionCheck::invalid(format!("subscription is already {from}"));
    }

    // Unknown is a read-side artifact, not a committable state.
    if from == S::Unknown || to == S::Unknown {
        return TransitionCheck::invalid("unknown is not a committable status");
    }
    if to == S::None {
        return TransitionCheck::invalid("subscriptions are never deleted back to none");
    }

    let allowed = match from {
        S::None => to.is_pending() || to == S::Active,
        s if s.is_pending() => matches!(to, S::Active | S::PaymentFailed | S::Cancelled),
        S::Active => matches!(to, S::Suspended | S::Cancelled | S::Expired) || to.is_pending(),
        S::Suspended => matches!(to, S::Active | S::Cancelled),
        S::PaymentFailed => to.is_pending() || matches!(to, S::Suspended | S::Cancelled),
        S::Cancelled | S::Expired => to.is_pending(),
        S::Unknown => false,
        _ => false,
    };

    if allowed {
        TransitionCheck::valid()
    } else {
        TransitionCheck::invalid(match from {
            S::Cancelled | S::Expired => {
                format!("{from} reactivates only through a pending state")
            }
            _ => format!("no edge from {from} to {to}"),
        })
    }
}
