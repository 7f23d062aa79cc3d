use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::billing;

/// Persisted invoice status. `overdue` is never stored; see [`EffectiveStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invoice_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

/// Status shown to users, derived from the stored status and the due date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveStatus {
    Pending,
    Overdue,
    Paid,
}

impl FromStr for EffectiveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EffectiveStatus::Pending),
            "overdue" => Ok(EffectiveStatus::Overdue),
            "paid" => Ok(EffectiveStatus::Paid),
            other => Err(format!("unknown invoice status '{}'", other)),
        }
    }
}

/// How a payment was settled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Boleto,
    CreditCard,
    BankTransfer,
    Cash,
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Other => "other",
        };
        f.write_str(s)
    }
}

/// Invoice entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub condominium_id: Uuid,
    pub invoice_number: Option<String>,
    #[schema(value_type = f64, example = 85.0)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn effective_status(&self, today: NaiveDate) -> EffectiveStatus {
        billing::effective_status(self.status, self.due_date, today)
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Values for a new invoice row. Always inserted as `pending`.
///
/// The id is chosen up front so the invoice number can be derived from it.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub condominium_id: Uuid,
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub description: Option<String>,
}

/// Request for an ad-hoc ("avulsa") invoice outside the recurring cycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdhocInvoice {
    pub condominium_id: Uuid,
    #[schema(value_type = f64, example = 85.0)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub description: Option<String>,
}

/// Payment metadata written by the `pending -> paid` transition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

/// Sortable invoice columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceSortField {
    DueDate,
    CreatedAt,
    Amount,
    InvoiceNumber,
}

impl InvoiceSortField {
    pub fn column(&self) -> &'static str {
        match self {
            InvoiceSortField::DueDate => "due_date",
            InvoiceSortField::CreatedAt => "created_at",
            InvoiceSortField::Amount => "amount",
            InvoiceSortField::InvoiceNumber => "invoice_number",
        }
    }
}

impl FromStr for InvoiceSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "due_date" => Ok(InvoiceSortField::DueDate),
            "created_at" => Ok(InvoiceSortField::CreatedAt),
            "amount" => Ok(InvoiceSortField::Amount),
            "invoice_number" => Ok(InvoiceSortField::InvoiceNumber),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Per-user listing preferences, passed explicitly into list queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ListPreferences {
    pub sort_by: InvoiceSortField,
    pub direction: SortDirection,
}

/// Which invoices to list.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub condominium_id: Option<Uuid>,
    pub status: Option<EffectiveStatus>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Count and total for one statistics bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatBucket {
    pub count: i64,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

impl StatBucket {
    pub fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount;
    }
}

/// Aggregate invoice statistics, recomputed from source rows on every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceStatistics {
    pub pending: StatBucket,
    pub paid: StatBucket,
    pub overdue: StatBucket,
    pub this_month: StatBucket,
}

/// Gross amount and discount recovered from an invoice description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiscountBreakdown {
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[schema(value_type = f64)]
    pub original_amount: Decimal,
    #[schema(value_type = Option<f64>)]
    pub discount_percent: Option<Decimal>,
    #[schema(value_type = f64)]
    pub discount_value: Decimal,
}

/// Invoice plus the values every view derives from it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub effective_status: EffectiveStatus,
    pub discount: DiscountBreakdown,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, today: NaiveDate) -> Self {
        let effective_status = invoice.effective_status(today);
        let discount = billing::discount_breakdown(invoice.amount, invoice.description.as_deref());
        Self {
            invoice,
            effective_status,
            discount,
        }
    }
}
