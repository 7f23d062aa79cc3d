use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{ResourceKind, Subscription};

/// Decide whether `amount` units of `kind` may be consumed from `subscription`
/// at `now`.
///
/// Lifetime subscriptions are never blocked by the period or the quota.
pub fn check_consumption(
    subscription: &Subscription,
    kind: ResourceKind,
    amount: i32,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if amount < 1 {
        return Err(AppError::InvalidInput(
            "amount must be at least 1".to_string(),
        ));
    }
    if !subscription.is_active {
        return Err(AppError::SubscriptionInactive {
            condominium_id: subscription.condominium_id,
        });
    }
    if subscription.is_lifetime {
        return Ok(());
    }
    if subscription.period_expired(now) {
        return Err(AppError::PeriodExpired {
            period_end: subscription.current_period_end,
        });
    }

    let counter = subscription.counter(kind);
    if !counter.fits(amount) {
        return Err(AppError::QuotaExceeded {
            resource: kind.to_string(),
            used: counter.used,
            requested: amount,
            capacity: counter.capacity(),
        });
    }
    Ok(())
}
