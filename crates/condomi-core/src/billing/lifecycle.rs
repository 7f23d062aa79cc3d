use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::invoice_number::invoice_number;
use super::period::{add_months, advance_period, PeriodAdvance};
use crate::config::BillingConfig;
use crate::error::AppError;
use crate::models::{NewInvoice, Plan, Subscription, SubscriptionOptions};

/// Invoice settings applied when a period rolls over.
#[derive(Debug, Clone)]
pub struct RolloverPolicy {
    pub invoice_due_days: u32,
    pub invoice_number_prefix: String,
}

impl From<&BillingConfig> for RolloverPolicy {
    fn from(config: &BillingConfig) -> Self {
        Self {
            invoice_due_days: config.invoice_due_days,
            invoice_number_prefix: config.invoice_number_prefix.clone(),
        }
    }
}

/// Changes a rollover applies to one subscription.
#[derive(Debug, Clone)]
pub struct RolloverPlan {
    pub period: PeriodAdvance,
    pub notifications_limit: i32,
    pub warnings_limit: i32,
    pub fines_limit: i32,
    pub package_notifications_limit: i32,
    pub invoice: Option<NewInvoice>,
}

impl RolloverPlan {
    /// Apply the new period and limits in place. Used counters go back to
    /// zero; purchased package extra is kept.
    pub fn apply(&self, subscription: &mut Subscription, now: DateTime<Utc>) {
        subscription.current_period_start = self.period.start;
        subscription.current_period_end = self.period.end;
        subscription.notifications_limit = self.notifications_limit;
        subscription.warnings_limit = self.warnings_limit;
        subscription.fines_limit = self.fines_limit;
        subscription.package_notifications_limit = self.package_notifications_limit;
        subscription.notifications_used = 0;
        subscription.warnings_used = 0;
        subscription.fines_used = 0;
        subscription.package_notifications_used = 0;
        subscription.updated_at = now;
    }
}

/// Work out the rollover for `subscription` at `now`.
///
/// Returns `Ok(None)` while the current period is still running. Lifetime
/// subscriptions and unexpired trials roll over without an invoice.
pub fn plan_rollover(
    subscription: &Subscription,
    plan: &Plan,
    now: DateTime<Utc>,
    policy: &RolloverPolicy,
) -> Result<Option<RolloverPlan>, AppError> {
    if subscription.current_period_end >= now {
        return Ok(None);
    }
    let period = advance_period(
        subscription.current_period_start,
        subscription.current_period_end,
        now,
    )
    .ok_or_else(|| AppError::Internal("Billing period overflowed the calendar".to_string()))?;

    let invoice = if subscription.is_lifetime || subscription.trial_active(now) {
        None
    } else {
        let id = Uuid::new_v4();
        let due_date = period.start.date_naive() + Duration::days(i64::from(policy.invoice_due_days));
        Some(NewInvoice {
            id,
            subscription_id: subscription.id,
            condominium_id: subscription.condominium_id,
            invoice_number: Some(invoice_number(&policy.invoice_number_prefix, now, id)),
            amount: plan.price,
            due_date,
            period_start: period.start,
            period_end: period.end,
            description: Some(format!(
                "Mensalidade {} {}",
                plan.name,
                period.start.format("%m/%Y")
            )),
        })
    };

    Ok(Some(RolloverPlan {
        period,
        notifications_limit: plan.notifications_limit,
        warnings_limit: plan.warnings_limit,
        fines_limit: plan.fines_limit,
        package_notifications_limit: plan.package_notifications_limit,
        invoice,
    }))
}

/// Build the subscription row for a newly onboarded condominium.
pub fn new_subscription(
    condominium_id: Uuid,
    plan: &Plan,
    options: &SubscriptionOptions,
    now: DateTime<Utc>,
) -> Result<Subscription, AppError> {
    if !plan.is_active {
        return Err(AppError::InvalidInput(format!(
            "Plan '{}' is not available",
            plan.tier
        )));
    }
    if options.package_notifications_extra < 0 {
        return Err(AppError::InvalidInput(
            "package_notifications_extra must not be negative".to_string(),
        ));
    }
    let period_end = add_months(now, 1)
        .ok_or_else(|| AppError::Internal("Billing period overflowed the calendar".to_string()))?;
    let trial_ends_at = options
        .trial_days
        .filter(|days| *days > 0)
        .map(|days| now + Duration::days(i64::from(days)));

    Ok(Subscription {
        id: Uuid::new_v4(),
        condominium_id,
        plan: plan.tier,
        is_active: true,
        is_trial: trial_ends_at.is_some(),
        trial_ends_at,
        is_lifetime: options.is_lifetime,
        current_period_start: now,
        current_period_end: period_end,
        notifications_limit: plan.notifications_limit,
        notifications_used: 0,
        warnings_limit: plan.warnings_limit,
        warnings_used: 0,
        fines_limit: plan.fines_limit,
        fines_used: 0,
        package_notifications_limit: plan.package_notifications_limit,
        package_notifications_extra: options.package_notifications_extra,
        package_notifications_used: 0,
        created_at: now,
        updated_at: now,
    })
}
