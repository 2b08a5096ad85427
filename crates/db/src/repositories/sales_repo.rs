//! Repositories for the sales ledger tables.

use sqlx::types::Json;
use sqlx::PgPool;
use cutroom_core::sales::{
    format_document_number, INVOICE_NUMBER_PREFIX, QUOTE_ACCEPTED, QUOTE_NUMBER_PREFIX,
};
use cutroom_core::types::DbId;

use crate::models::sales::{
    CreatePayment, CreateSalesClient, Invoice, InvoiceFields, Payment, Quote, QuoteFields,
    SalesClient, UpdateSalesClient,
};

/* --------------------------------------------------------------------------
Clients
-------------------------------------------------------------------------- */

const CLIENT_COLUMNS: &str = "id, name, email, phone, address, notes, created_at, updated_at";

pub struct SalesClientRepo;

impl SalesClientRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateSalesClient,
    ) -> Result<SalesClient, sqlx::Error> {
        let query = format!(
            "INSERT INTO sales_clients (name, email, phone, address, notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CLIENT_COLUMNS}"
        );
        sqlx::query_as::<_, SalesClient>(&query)
            .bind(input.name.trim())
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SalesClient>, sqlx::Error> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM sales_clients WHERE id = $1");
        sqlx::query_as::<_, SalesClient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<SalesClient>, sqlx::Error> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM sales_clients ORDER BY name ASC");
        sqlx::query_as::<_, SalesClient>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSalesClient,
    ) -> Result<Option<SalesClient>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_clients SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                notes = COALESCE($6, notes)
             WHERE id = $1
             RETURNING {CLIENT_COLUMNS}"
        );
        sqlx::query_as::<_, SalesClient>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Delete a client. Fails with a foreign-key violation while quotes or
    /// invoices still reference it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sales_clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/* --------------------------------------------------------------------------
Quotes
-------------------------------------------------------------------------- */

const QUOTE_COLUMNS: &str = "id, number_seq, quote_number, client_id, project_id, status, \
    issue_date, valid_until, currency, line_items, tax_rate_bps, subtotal_cents, tax_cents, \
    total_cents, notes, created_at, updated_at";

pub struct QuoteRepo;

impl QuoteRepo {
    /// Insert a quote, assigning the next quote number.
    pub async fn create(pool: &PgPool, input: &QuoteFields) -> Result<Quote, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let seq: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(number_seq), 0) + 1 FROM sales_quotes")
                .fetch_one(&mut *tx)
                .await?;

        let query = format!(
            "INSERT INTO sales_quotes
                (number_seq, quote_number, client_id, project_id, status, issue_date, valid_until,
                 currency, line_items, tax_rate_bps, subtotal_cents, tax_cents, total_cents, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {QUOTE_COLUMNS}"
        );
        let quote = sqlx::query_as::<_, Quote>(&query)
            .bind(seq)
            .bind(format_document_number(QUOTE_NUMBER_PREFIX, seq))
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(&input.status)
            .bind(input.issue_date)
            .bind(input.valid_until)
            .bind(&input.currency)
            .bind(Json(&input.line_items))
            .bind(input.tax_rate_bps)
            .bind(input.subtotal_cents)
            .bind(input.tax_cents)
            .bind(input.total_cents)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(quote)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Quote>, sqlx::Error> {
        let query = format!("SELECT {QUOTE_COLUMNS} FROM sales_quotes WHERE id = $1");
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List quotes, newest first, optionally for one client.
    pub async fn list(pool: &PgPool, client_id: Option<DbId>) -> Result<Vec<Quote>, sqlx::Error> {
        let query = format!(
            "SELECT {QUOTE_COLUMNS} FROM sales_quotes
             WHERE ($1::BIGINT IS NULL OR client_id = $1)
             ORDER BY issue_date DESC, number_seq DESC"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite every writable column. The number is kept.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &QuoteFields,
    ) -> Result<Option<Quote>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_quotes SET
                client_id = $2, project_id = $3, status = $4, issue_date = $5, valid_until = $6,
                currency = $7, line_items = $8, tax_rate_bps = $9, subtotal_cents = $10,
                tax_cents = $11, total_cents = $12, notes = $13
             WHERE id = $1
             RETURNING {QUOTE_COLUMNS}"
        );
        sqlx::query_as::<_, Quote>(&query)
            .bind(id)
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(&input.status)
            .bind(input.issue_date)
            .bind(input.valid_until)
            .bind(&input.currency)
            .bind(Json(&input.line_items))
            .bind(input.tax_rate_bps)
            .bind(input.subtotal_cents)
            .bind(input.tax_cents)
            .bind(input.total_cents)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sales_quotes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/* --------------------------------------------------------------------------
Invoices
-------------------------------------------------------------------------- */

/// Invoice columns plus the running payment total. The subquery refers to
/// the unaliased table so it works in both SELECT and RETURNING.
const INVOICE_COLUMNS: &str = "id, number_seq, invoice_number, client_id, project_id, quote_id, \
    status, issue_date, due_date, currency, line_items, tax_rate_bps, subtotal_cents, tax_cents, \
    total_cents, notes, created_at, updated_at, \
    COALESCE((SELECT SUM(p.amount_cents) FROM sales_payments p \
              WHERE p.invoice_id = sales_invoices.id), 0)::BIGINT AS paid_cents";

pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Insert an invoice, assigning the next invoice number.
    pub async fn create(pool: &PgPool, input: &InvoiceFields) -> Result<Invoice, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let invoice = Self::insert(&mut tx, input).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &InvoiceFields,
    ) -> Result<Invoice, sqlx::Error> {
        let seq: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(number_seq), 0) + 1 FROM sales_invoices")
                .fetch_one(&mut **tx)
                .await?;

        let query = format!(
            "INSERT INTO sales_invoices
                (number_seq, invoice_number, client_id, project_id, quote_id, status, issue_date,
                 due_date, currency, line_items, tax_rate_bps, subtotal_cents, tax_cents,
                 total_cents, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {INVOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(seq)
            .bind(format_document_number(INVOICE_NUMBER_PREFIX, seq))
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(input.quote_id)
            .bind(&input.status)
            .bind(input.issue_date)
            .bind(input.due_date)
            .bind(&input.currency)
            .bind(Json(&input.line_items))
            .bind(input.tax_rate_bps)
            .bind(input.subtotal_cents)
            .bind(input.tax_cents)
            .bind(input.total_cents)
            .bind(&input.notes)
            .fetch_one(&mut **tx)
            .await
    }

    /// Create an invoice from a quote and mark the quote accepted, in one
    /// transaction. The unique `quote_id` constraint rejects a second
    /// conversion.
    ///
    /// Returns `None` if the quote does not exist.
    pub async fn create_from_quote(
        pool: &PgPool,
        quote_id: DbId,
        input: &InvoiceFields,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query("UPDATE sales_quotes SET status = $2 WHERE id = $1")
            .bind(quote_id)
            .bind(QUOTE_ACCEPTED)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let invoice = Self::insert(&mut tx, input).await?;
        tx.commit().await?;
        Ok(Some(invoice))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM sales_invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The invoice created from a quote, if any.
    pub async fn find_by_quote(
        pool: &PgPool,
        quote_id: DbId,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {INVOICE_COLUMNS} FROM sales_invoices WHERE quote_id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(quote_id)
            .fetch_optional(pool)
            .await
    }

    /// List invoices, newest first, optionally for one client.
    pub async fn list(pool: &PgPool, client_id: Option<DbId>) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM sales_invoices
             WHERE ($1::BIGINT IS NULL OR client_id = $1)
             ORDER BY issue_date DESC, number_seq DESC"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite every writable column. The number and quote link are kept.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &InvoiceFields,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!(
            "UPDATE sales_invoices SET
                client_id = $2, project_id = $3, status = $4, issue_date = $5, due_date = $6,
                currency = $7, line_items = $8, tax_rate_bps = $9, subtotal_cents = $10,
                tax_cents = $11, total_cents = $12, notes = $13
             WHERE id = $1
             RETURNING {INVOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(&input.status)
            .bind(input.issue_date)
            .bind(input.due_date)
            .bind(&input.currency)
            .bind(Json(&input.line_items))
            .bind(input.tax_rate_bps)
            .bind(input.subtotal_cents)
            .bind(input.tax_cents)
            .bind(input.total_cents)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Delete an invoice and its payments.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sales_invoices WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/* --------------------------------------------------------------------------
Payments
-------------------------------------------------------------------------- */

const PAYMENT_COLUMNS: &str = "id, invoice_id, amount_cents, paid_on, method, reference, notes, created_at";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn create(
        pool: &PgPool,
        invoice_id: DbId,
        input: &CreatePayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO sales_payments (invoice_id, amount_cents, paid_on, method, reference, notes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(invoice_id)
            .bind(input.amount_cents)
            .bind(input.paid_on)
            .bind(&input.method)
            .bind(&input.reference)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM sales_payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_invoice(
        pool: &PgPool,
        invoice_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM sales_payments
             WHERE invoice_id = $1
             ORDER BY paid_on ASC, id ASC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(invoice_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sales_payments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
