use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Plan tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "plan_tier", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Start,
    Essencial,
    Profissional,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Start => "start",
            PlanTier::Essencial => "essencial",
            PlanTier::Profissional => "profissional",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(PlanTier::Start),
            "essencial" => Ok(PlanTier::Essencial),
            "profissional" => Ok(PlanTier::Profissional),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("unknown plan tier '{}'", other)),
        }
    }
}

/// Plan reference data: allotments per billing period and monthly price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Plan {
    pub id: Uuid,
    pub tier: PlanTier,
    pub name: String,
    pub notifications_limit: i32,
    pub warnings_limit: i32,
    pub fines_limit: i32,
    pub package_notifications_limit: i32,
    #[schema(value_type = f64, example = 149.90)]
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial plan update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub notifications_limit: Option<i32>,
    pub warnings_limit: Option<i32>,
    pub fines_limit: Option<i32>,
    pub package_notifications_limit: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl PlanUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.notifications_limit.is_none()
            && self.warnings_limit.is_none()
            && self.fines_limit.is_none()
            && self.package_notifications_limit.is_none()
            && self.price.is_none()
            && self.is_active.is_none()
    }

    /// Rejects negative allotments and prices.
    pub fn validate(&self) -> Result<(), String> {
        let limits = [
            ("notifications_limit", self.notifications_limit),
            ("warnings_limit", self.warnings_limit),
            ("fines_limit", self.fines_limit),
            ("package_notifications_limit", self.package_notifications_limit),
        ];
        for (field, value) in limits {
            if matches!(value, Some(v) if v < 0) {
                return Err(format!("{} must not be negative", field));
            }
        }
        if matches!(self.price, Some(p) if p.is_sign_negative()) {
            return Err("price must not be negative".to_string());
        }
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }

    /// Apply the update to a plan row in place.
    pub fn apply_to(&self, plan: &mut Plan) {
        if let Some(ref name) = self.name {
            plan.name = name.trim().to_string();
        }
        if let Some(v) = self.notifications_limit {
            plan.notifications_limit = v;
        }
        if let Some(v) = self.warnings_limit {
            plan.warnings_limit = v;
        }
        if let Some(v) = self.fines_limit {
            plan.fines_limit = v;
        }
        if let Some(v) = self.package_notifications_limit {
            plan.package_notifications_limit = v;
        }
        if let Some(v) = self.price {
            plan.price = v;
        }
        if let Some(v) = self.is_active {
            plan.is_active = v;
        }
    }
}
