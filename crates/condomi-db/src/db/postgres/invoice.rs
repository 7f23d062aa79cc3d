use async_trait::async_trait;
use condomi_core::models::{Invoice, ListPreferences, NewInvoice, PaymentRecord};
use condomi_core::AppError;
use sqlx::{PgExecutor, PgPool, Postgres};
use uuid::Uuid;

use super::INVOICE_COLUMNS;
use crate::db::store::InvoiceStore;

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert a `pending` invoice on any executor, so rollover can issue it
/// inside its own transaction.
pub(crate) async fn insert_invoice<'e, E>(executor: E, invoice: &NewInvoice) -> Result<Invoice, AppError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<Postgres, Invoice>(&format!(
        r#"
        INSERT INTO invoices (
            id, subscription_id, condominium_id, invoice_number, amount, due_date,
            period_start, period_end, status, description
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9)
        RETURNING {}
        "#,
        INVOICE_COLUMNS
    ))
    .bind(invoice.id)
    .bind(invoice.subscription_id)
    .bind(invoice.condominium_id)
    .bind(invoice.invoice_number.as_deref())
    .bind(invoice.amount)
    .bind(invoice.due_date)
    .bind(invoice.period_start)
    .bind(invoice.period_end)
    .bind(invoice.description.as_deref())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    #[tracing::instrument(skip(self, invoice), fields(db.table = "invoices", db.operation = "insert", invoice_id = %invoice.id))]
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let row = insert_invoice(&self.pool, &invoice).await?;
        tracing::info!(
            invoice_number = ?row.invoice_number,
            condominium_id = %row.condominium_id,
            "Invoice created"
        );
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invoices", db.operation = "select"))]
    async fn get(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let row = sqlx::query_as::<Postgres, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, payment), fields(db.table = "invoices", db.operation = "update"))]
    async fn mark_paid(
        &self,
        invoice_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<Invoice, AppError> {
        // The status guard makes this the only writer that wins; a second
        // confirmation matches zero rows.
        let updated = sqlx::query_as::<Postgres, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = 'paid',
                paid_at = $2,
                payment_method = $3,
                payment_reference = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(payment.paid_at)
        .bind(payment.method)
        .bind(payment.reference.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(invoice) = updated {
            return Ok(invoice);
        }

        match self.get(invoice_id).await? {
            Some(existing) => Err(AppError::AlreadyPaid {
                invoice_id,
                paid_at: existing.paid_at,
            }),
            None => Err(AppError::NotFound(format!("Invoice {} not found", invoice_id))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "invoices", db.operation = "select_list"))]
    async fn list(
        &self,
        condominium_id: Option<Uuid>,
        preferences: ListPreferences,
    ) -> Result<Vec<Invoice>, AppError> {
        // Column and direction come from closed enums, never from input text.
        let rows = sqlx::query_as::<Postgres, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::uuid IS NULL OR condominium_id = $1)
            ORDER BY {} {} NULLS LAST, id ASC
            "#,
            INVOICE_COLUMNS,
            preferences.sort_by.column(),
            preferences.direction.keyword()
        ))
        .bind(condominium_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
