use super::plan::PlanTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Metered resource kinds consumed from a subscription's quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Notification,
    Warning,
    Fine,
    PackageNotification,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Notification,
        ResourceKind::Warning,
        ResourceKind::Fine,
        ResourceKind::PackageNotification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Notification => "notification",
            ResourceKind::Warning => "warning",
            ResourceKind::Fine => "fine",
            ResourceKind::PackageNotification => "package_notification",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notification" | "notifications" => Ok(ResourceKind::Notification),
            "warning" | "warnings" => Ok(ResourceKind::Warning),
            "fine" | "fines" => Ok(ResourceKind::Fine),
            "package_notification" | "package_notifications" => {
                Ok(ResourceKind::PackageNotification)
            }
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

/// Subscription entity, one per condominium.
///
/// The billing period is half-open: `[current_period_start, current_period_end)`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub condominium_id: Uuid,
    pub plan: PlanTier,
    pub is_active: bool,
    pub is_trial: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub is_lifetime: bool,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub notifications_limit: i32,
    pub notifications_used: i32,
    pub warnings_limit: i32,
    pub warnings_used: i32,
    pub fines_limit: i32,
    pub fines_used: i32,
    pub package_notifications_limit: i32,
    pub package_notifications_extra: i32,
    pub package_notifications_used: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of one usage counter paired with its allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsageCounter {
    pub kind: ResourceKind,
    pub limit: i32,
    pub extra: i32,
    pub used: i32,
}

impl UsageCounter {
    /// Total allotment for the period: plan-granted plus purchased extra.
    pub fn capacity(&self) -> i32 {
        self.limit.saturating_add(self.extra)
    }

    pub fn remaining(&self) -> i32 {
        self.capacity().saturating_sub(self.used)
    }

    /// Whether `amount` more units fit without crossing the capacity.
    pub fn fits(&self, amount: i32) -> bool {
        i64::from(self.used) + i64::from(amount) <= i64::from(self.capacity())
    }
}

impl Subscription {
    pub fn counter(&self, kind: ResourceKind) -> UsageCounter {
        let (limit, extra, used) = match kind {
            ResourceKind::Notification => (self.notifications_limit, 0, self.notifications_used),
            ResourceKind::Warning => (self.warnings_limit, 0, self.warnings_used),
            ResourceKind::Fine => (self.fines_limit, 0, self.fines_used),
            ResourceKind::PackageNotification => (
                self.package_notifications_limit,
                self.package_notifications_extra,
                self.package_notifications_used,
            ),
        };
        UsageCounter {
            kind,
            limit,
            extra,
            used,
        }
    }

    pub fn counters(&self) -> Vec<UsageCounter> {
        ResourceKind::ALL.iter().map(|k| self.counter(*k)).collect()
    }

    /// Add to the `<kind>_used` counter. Callers check the quota first.
    pub fn add_usage(&mut self, kind: ResourceKind, amount: i32) {
        let used = match kind {
            ResourceKind::Notification => &mut self.notifications_used,
            ResourceKind::Warning => &mut self.warnings_used,
            ResourceKind::Fine => &mut self.fines_used,
            ResourceKind::PackageNotification => &mut self.package_notifications_used,
        };
        *used = used.saturating_add(amount);
    }

    /// A non-lifetime subscription whose period ended before `now`.
    pub fn period_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_lifetime && self.current_period_end < now
    }

    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        self.is_trial && self.trial_ends_at.is_some_and(|ends| ends > now)
    }
}

/// Result of a successful quota consumption.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageReceipt {
    pub condominium_id: Uuid,
    pub kind: ResourceKind,
    pub used: i32,
    pub capacity: i32,
    pub remaining: i32,
    /// Lifetime subscriptions are counted but never blocked.
    pub unmetered: bool,
}

impl UsageReceipt {
    pub fn from_subscription(subscription: &Subscription, kind: ResourceKind) -> Self {
        let counter = subscription.counter(kind);
        Self {
            condominium_id: subscription.condominium_id,
            kind,
            used: counter.used,
            capacity: counter.capacity(),
            remaining: counter.remaining(),
            unmetered: subscription.is_lifetime,
        }
    }
}

/// Read-only view of every counter on a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    pub condominium_id: Uuid,
    pub plan: PlanTier,
    pub is_lifetime: bool,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub counters: Vec<UsageCounterView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageCounterView {
    pub kind: ResourceKind,
    pub limit: i32,
    pub extra: i32,
    pub used: i32,
    pub remaining: i32,
}

impl From<UsageCounter> for UsageCounterView {
    fn from(c: UsageCounter) -> Self {
        Self {
            kind: c.kind,
            limit: c.limit,
            extra: c.extra,
            used: c.used,
            remaining: c.remaining(),
        }
    }
}

impl From<&Subscription> for UsageSummary {
    fn from(s: &Subscription) -> Self {
        Self {
            condominium_id: s.condominium_id,
            plan: s.plan,
            is_lifetime: s.is_lifetime,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
            counters: s.counters().into_iter().map(Into::into).collect(),
        }
    }
}

/// Options chosen when a condominium is onboarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionOptions {
    #[serde(default)]
    pub is_lifetime: bool,
    /// Trial length in days; `None` or `0` means no trial.
    pub trial_days: Option<u32>,
    #[serde(default)]
    pub package_notifications_extra: i32,
}

/// Outcome of a period rollover.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RolloverOutcome {
    pub subscription: Subscription,
    pub rolled_over: bool,
    pub invoice: Option<super::invoice::Invoice>,
}
