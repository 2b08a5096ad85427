//! Sales ledger models: clients, quotes, invoices and payments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use cutroom_core::sales::LineItem;
use cutroom_core::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Clients
-------------------------------------------------------------------------- */

/// A row from the `sales_clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesClient {
    pub id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateSalesClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSalesClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/* --------------------------------------------------------------------------
Quotes
-------------------------------------------------------------------------- */

/// A row from the `sales_quotes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quote {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub number_seq: i32,
    pub quote_number: String,
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub status: String,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub currency: String,
    pub line_items: Json<Vec<LineItem>>,
    pub tax_rate_bps: i32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Writable quote columns, used for both insert and full update.
/// Totals are computed by the caller.
#[derive(Debug)]
pub struct QuoteFields {
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub status: String,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: i32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
}

/* --------------------------------------------------------------------------
Invoices
-------------------------------------------------------------------------- */

/// A row from the `sales_invoices` table plus the sum of its payments.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub number_seq: i32,
    pub invoice_number: String,
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub quote_id: Option<DbId>,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub line_items: Json<Vec<LineItem>>,
    pub tax_rate_bps: i32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub paid_cents: i64,
}

/// Writable invoice columns, used for both insert and full update.
/// Totals are computed by the caller.
#[derive(Debug)]
pub struct InvoiceFields {
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub quote_id: Option<DbId>,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: i32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
}

/* --------------------------------------------------------------------------
Payments
-------------------------------------------------------------------------- */

/// A row from the `sales_payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub invoice_id: DbId,
    pub amount_cents: i64,
    pub paid_on: NaiveDate,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreatePayment {
    pub amount_cents: i64,
    pub paid_on: NaiveDate,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}
