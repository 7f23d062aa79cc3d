use chrono::NaiveDate;

use super::period::month_bounds;
use crate::models::{EffectiveStatus, Invoice, InvoiceStatistics};

/// Aggregate invoices in a single pass.
///
/// `pending`, `paid` and `overdue` partition the input by effective status.
/// `this_month` counts every invoice whose due date falls in the month of
/// `today`, whatever its status.
pub fn compute_statistics<'a, I>(invoices: I, today: NaiveDate) -> InvoiceStatistics
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let (month_start, month_end) = month_bounds(today);
    let mut stats = InvoiceStatistics::default();

    for invoice in invoices {
        match invoice.effective_status(today) {
            EffectiveStatus::Pending => stats.pending.add(invoice.amount),
            EffectiveStatus::Overdue => stats.overdue.add(invoice.amount),
            EffectiveStatus::Paid => stats.paid.add(invoice.amount),
        }
        if invoice.due_date >= month_start && invoice.due_date <= month_end {
            stats.this_month.add(invoice.amount);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn invoice(amount: i64, due: NaiveDate, status: InvoiceStatus) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            condominium_id: Uuid::new_v4(),
            invoice_number: None,
            amount: Decimal::new(amount, 0),
            due_date: due,
            period_start: now,
            period_end: now,
            status,
            paid_at: (status == InvoiceStatus::Paid).then_some(now),
            payment_method: None,
            payment_reference: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_buckets_partition_by_effective_status() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let rows = vec![
            invoice(100, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(), InvoiceStatus::Pending),
            invoice(50, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), InvoiceStatus::Pending),
            invoice(70, NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(), InvoiceStatus::Paid),
            invoice(30, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(), InvoiceStatus::Pending),
        ];

        let stats = compute_statistics(&rows, today);

        assert_eq!(stats.pending.count, 1);
        assert_eq!(stats.pending.total, Decimal::new(100, 0));
        assert_eq!(stats.overdue.count, 2);
        assert_eq!(stats.overdue.total, Decimal::new(80, 0));
        assert_eq!(stats.paid.count, 1);
        assert_eq!(stats.paid.total, Decimal::new(70, 0));
        assert_eq!(
            stats.pending.count + stats.overdue.count + stats.paid.count,
            rows.len() as i64
        );
    }

    #[test]
    fn test_this_month_spans_statuses() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let rows = vec![
            invoice(10, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), InvoiceStatus::Pending),
            invoice(20, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), InvoiceStatus::Paid),
            invoice(40, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), InvoiceStatus::Pending),
        ];

        let stats = compute_statistics(&rows, today);

        assert_eq!(stats.this_month.count, 2);
        assert_eq!(stats.this_month.total, Decimal::new(30, 0));
    }

    #[test]
    fn test_empty_input() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let stats = compute_statistics(std::iter::empty(), today);
        assert_eq!(stats, InvoiceStatistics::default());
    }
}
