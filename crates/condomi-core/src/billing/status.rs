use chrono::NaiveDate;

use crate::models::{EffectiveStatus, InvoiceStatus};

/// The overdue predicate. Every view that shows or filters by status goes
/// through here.
pub fn is_overdue(status: InvoiceStatus, due_date: NaiveDate, today: NaiveDate) -> bool {
    status == InvoiceStatus::Pending && due_date < today
}

pub fn effective_status(
    status: InvoiceStatus,
    due_date: NaiveDate,
    today: NaiveDate,
) -> EffectiveStatus {
    match status {
        InvoiceStatus::Paid => EffectiveStatus::Paid,
        InvoiceStatus::Pending if is_overdue(status, due_date, today) => EffectiveStatus::Overdue,
        InvoiceStatus::Pending => EffectiveStatus::Pending,
    }
}
