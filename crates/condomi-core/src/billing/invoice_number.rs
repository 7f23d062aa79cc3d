use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Human-facing invoice number: `{prefix}-{YYYYMM}-{id as 32 hex digits}`.
///
/// The whole id goes in so the number is as unique as the invoice id.
pub fn invoice_number(prefix: &str, issued_at: DateTime<Utc>, invoice_id: Uuid) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        issued_at.format("%Y%m"),
        invoice_id.simple().to_string().to_uppercase()
    )
}
