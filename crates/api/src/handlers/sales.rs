//! Handlers for the sales ledger: clients, quotes, invoices and payments.
//!
//! Totals are always recomputed server-side from the line items. Every
//! route requires the admin role.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use cutroom_core::error::CoreError;
use cutroom_core::sales::{
    balance_cents, compute_totals, fiscal_year_of, invoice_effective_status,
    quote_effective_status, summarize_by_fiscal_year, validate_invoice_status,
    validate_line_items, validate_quote_status, FiscalYearSummary, InvoiceFigures, LineItem,
    INVOICE_CANCELLED, INVOICE_DRAFT, MAX_AMOUNT_CENTS, QUOTE_ACCEPTED, QUOTE_DRAFT,
    QUOTE_REJECTED, QUOTE_SENT,
};
use cutroom_core::types::DbId;
use cutroom_db::models::sales::{
    CreatePayment, CreateSalesClient, Invoice, InvoiceFields, Payment, Quote, QuoteFields,
    SalesClient, UpdateSalesClient,
};
use cutroom_db::repositories::{
    InvoiceRepo, PaymentRepo, ProjectRepo, QuoteRepo, SalesClientRepo, SettingsRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::admin::{validate_currency, validate_email};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Days until payment is due when converting a quote without a due date.
const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SalesListParams {
    pub client_id: Option<DbId>,
}

/// Body for creating or replacing a quote.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: Option<i32>,
    pub notes: Option<String>,
}

/// Body for creating or replacing an invoice.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub client_id: DbId,
    pub project_id: Option<DbId>,
    pub status: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub tax_rate_bps: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuoteRequest {
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub fiscal_year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    pub effective_status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub effective_status: &'static str,
    pub balance_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub payments: Vec<Payment>,
}

/// Quote counts for one fiscal year.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteCounts {
    pub fiscal_year: i32,
    /// Draft or sent and not yet expired.
    pub open: i64,
    pub accepted: i64,
}

#[derive(Debug, Serialize)]
pub struct SalesSummary {
    pub fiscal_year_start_month: i16,
    pub invoices: Vec<FiscalYearSummary>,
    pub quotes: Vec<QuoteCounts>,
}

impl QuoteResponse {
    fn new(quote: Quote, today: NaiveDate) -> Self {
        let effective_status = quote_effective_status(&quote.status, quote.valid_until, today);
        Self {
            quote,
            effective_status,
        }
    }
}

impl InvoiceResponse {
    fn new(invoice: Invoice, today: NaiveDate) -> Self {
        let effective_status = invoice_effective_status(
            &invoice.status,
            invoice.total_cents,
            invoice.paid_cents,
            invoice.due_date,
            today,
        );
        Self {
            balance_cents: balance_cents(invoice.total_cents, invoice.paid_cents),
            effective_status,
            invoice,
        }
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// GET /api/v1/sales/clients
pub async fn list_clients(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<SalesClient>>>> {
    let clients = SalesClientRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// POST /api/v1/sales/clients
pub async fn create_client(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateSalesClient>,
) -> AppResult<(StatusCode, Json<DataResponse<SalesClient>>)> {
    validate_client_name(&input.name)?;
    if let Some(email) = input.email.as_deref() {
        validate_email(email)?;
    }
    let client = SalesClientRepo::create(&state.pool, &input).await?;
    tracing::info!(client_id = client.id, "Sales client created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// GET /api/v1/sales/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SalesClient>>> {
    let client = find_client(&state, id).await?;
    Ok(Json(DataResponse { data: client }))
}

/// PUT /api/v1/sales/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSalesClient>,
) -> AppResult<Json<DataResponse<SalesClient>>> {
    if let Some(name) = input.name.as_deref() {
        validate_client_name(name)?;
    }
    if let Some(email) = input.email.as_deref() {
        validate_email(email)?;
    }
    let client = SalesClientRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("SalesClient", id))?;
    Ok(Json(DataResponse { data: client }))
}

/// DELETE /api/v1/sales/clients/{id}
///
/// 409 while quotes or invoices still reference the client.
pub async fn delete_client(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if SalesClientRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("SalesClient", id))
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// GET /api/v1/sales/quotes?client_id=
pub async fn list_quotes(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<SalesListParams>,
) -> AppResult<Json<DataResponse<Vec<QuoteResponse>>>> {
    let today = Utc::now().date_naive();
    let quotes = QuoteRepo::list(&state.pool, params.client_id)
        .await?
        .into_iter()
        .map(|q| QuoteResponse::new(q, today))
        .collect();
    Ok(Json(DataResponse { data: quotes }))
}

/// POST /api/v1/sales/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<QuoteRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<QuoteResponse>>)> {
    let settings = SettingsRepo::get(&state.pool).await?;
    let defaults = DocumentDefaults {
        status: QUOTE_DRAFT.to_string(),
        issue_date: Utc::now().date_naive(),
        currency: settings.default_currency,
        tax_rate_bps: settings.default_tax_rate_bps,
    };
    let fields = quote_fields(&state, input, defaults).await?;
    let quote = QuoteRepo::create(&state.pool, &fields).await?;
    tracing::info!(quote_id = quote.id, number = %quote.quote_number, "Quote created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: QuoteResponse::new(quote, Utc::now().date_naive()),
        }),
    ))
}

/// GET /api/v1/sales/quotes/{id}
pub async fn get_quote(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<QuoteResponse>>> {
    let quote = find_quote(&state, id).await?;
    Ok(Json(DataResponse {
        data: QuoteResponse::new(quote, Utc::now().date_naive()),
    }))
}

/// PUT /api/v1/sales/quotes/{id}
///
/// Replaces the quote. Omitted status, dates, currency and tax rate keep
/// their current values.
pub async fn update_quote(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<QuoteRequest>,
) -> AppResult<Json<DataResponse<QuoteResponse>>> {
    let existing = find_quote(&state, id).await?;
    let defaults = DocumentDefaults {
        status: existing.status,
        issue_date: existing.issue_date,
        currency: existing.currency,
        tax_rate_bps: existing.tax_rate_bps,
    };
    let fields = quote_fields(&state, input, defaults).await?;
    let quote = QuoteRepo::update(&state.pool, id, &fields)
        .await?
        .ok_or(AppError::not_found("Quote", id))?;
    Ok(Json(DataResponse {
        data: QuoteResponse::new(quote, Utc::now().date_naive()),
    }))
}

/// DELETE /api/v1/sales/quotes/{id}
pub async fn delete_quote(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if QuoteRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Quote", id))
    }
}

/// POST /api/v1/sales/quotes/{id}/convert
///
/// Creates a draft invoice carrying the quote's lines and marks the quote
/// accepted. A quote converts at most once.
pub async fn convert_quote(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    input: Option<Json<ConvertQuoteRequest>>,
) -> AppResult<(StatusCode, Json<DataResponse<InvoiceResponse>>)> {
    let Json(input) = input.unwrap_or_default();
    let quote = find_quote(&state, id).await?;

    if let Some(invoice) = InvoiceRepo::find_by_quote(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Quote {} was already converted to invoice {}",
            quote.quote_number, invoice.invoice_number
        ))));
    }
    if quote.status == QUOTE_REJECTED {
        return Err(AppError::Core(CoreError::Conflict(
            "A rejected quote cannot be converted".into(),
        )));
    }

    let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let due_date = input
        .due_date
        .unwrap_or(issue_date + chrono::Duration::days(DEFAULT_PAYMENT_TERMS_DAYS));
    if due_date < issue_date {
        return Err(AppError::Core(CoreError::Validation(
            "Due date must not precede the issue date".into(),
        )));
    }

    let fields = InvoiceFields {
        client_id: quote.client_id,
        project_id: quote.project_id,
        quote_id: Some(quote.id),
        status: INVOICE_DRAFT.to_string(),
        issue_date,
        due_date: Some(due_date),
        currency: quote.currency.clone(),
        line_items: quote.line_items.0.clone(),
        tax_rate_bps: quote.tax_rate_bps,
        subtotal_cents: quote.subtotal_cents,
        tax_cents: quote.tax_cents,
        total_cents: quote.total_cents,
        notes: quote.notes.clone(),
    };
    let invoice = InvoiceRepo::create_from_quote(&state.pool, id, &fields)
        .await?
        .ok_or(AppError::not_found("Quote", id))?;

    tracing::info!(
        quote_id = id,
        invoice_id = invoice.id,
        user_id = admin.user_id,
        "Quote converted to invoice"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: InvoiceResponse::new(invoice, Utc::now().date_naive()),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// GET /api/v1/sales/invoices?client_id=
pub async fn list_invoices(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<SalesListParams>,
) -> AppResult<Json<DataResponse<Vec<InvoiceResponse>>>> {
    let today = Utc::now().date_naive();
    let invoices = InvoiceRepo::list(&state.pool, params.client_id)
        .await?
        .into_iter()
        .map(|i| InvoiceResponse::new(i, today))
        .collect();
    Ok(Json(DataResponse { data: invoices }))
}

/// POST /api/v1/sales/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<InvoiceRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<InvoiceResponse>>)> {
    let settings = SettingsRepo::get(&state.pool).await?;
    let defaults = DocumentDefaults {
        status: INVOICE_DRAFT.to_string(),
        issue_date: Utc::now().date_naive(),
        currency: settings.default_currency,
        tax_rate_bps: settings.default_tax_rate_bps,
    };
    let fields = invoice_fields(&state, input, None, defaults).await?;
    let invoice = InvoiceRepo::create(&state.pool, &fields).await?;
    tracing::info!(invoice_id = invoice.id, number = %invoice.invoice_number, "Invoice created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: InvoiceResponse::new(invoice, Utc::now().date_naive()),
        }),
    ))
}

/// GET /api/v1/sales/invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceDetail>>> {
    let invoice = find_invoice(&state, id).await?;
    let payments = PaymentRepo::list_by_invoice(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: InvoiceDetail {
            invoice: InvoiceResponse::new(invoice, Utc::now().date_naive()),
            payments,
        },
    }))
}

/// PUT /api/v1/sales/invoices/{id}
///
/// Replaces the invoice. Omitted status, dates, currency and tax rate
/// keep their current values.
pub async fn update_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<InvoiceRequest>,
) -> AppResult<Json<DataResponse<InvoiceResponse>>> {
    let existing = find_invoice(&state, id).await?;
    let quote_id = existing.quote_id;
    let defaults = DocumentDefaults {
        status: existing.status,
        issue_date: existing.issue_date,
        currency: existing.currency,
        tax_rate_bps: existing.tax_rate_bps,
    };
    let input = InvoiceRequest {
        due_date: input.due_date.or(existing.due_date),
        ..input
    };
    let fields = invoice_fields(&state, input, quote_id, defaults).await?;
    let invoice = InvoiceRepo::update(&state.pool, id, &fields)
        .await?
        .ok_or(AppError::not_found("Invoice", id))?;
    Ok(Json(DataResponse {
        data: InvoiceResponse::new(invoice, Utc::now().date_naive()),
    }))
}

/// DELETE /api/v1/sales/invoices/{id}
///
/// Payments on the invoice are deleted with it.
pub async fn delete_invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if InvoiceRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Invoice", id))
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// GET /api/v1/sales/invoices/{id}/payments
pub async fn list_payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(invoice_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    find_invoice(&state, invoice_id).await?;
    let payments = PaymentRepo::list_by_invoice(&state.pool, invoice_id).await?;
    Ok(Json(DataResponse { data: payments }))
}

/// POST /api/v1/sales/invoices/{id}/payments
pub async fn create_payment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(invoice_id): Path<DbId>,
    Json(input): Json<CreatePayment>,
) -> AppResult<(StatusCode, Json<DataResponse<Payment>>)> {
    let invoice = find_invoice(&state, invoice_id).await?;
    if invoice.status == INVOICE_CANCELLED {
        return Err(AppError::Core(CoreError::Conflict(
            "Payments cannot be recorded against a cancelled invoice".into(),
        )));
    }
    if !(1..=MAX_AMOUNT_CENTS).contains(&input.amount_cents) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Payment amount must be between 1 and {MAX_AMOUNT_CENTS} cents"
        ))));
    }
    let payment = PaymentRepo::create(&state.pool, invoice_id, &input).await?;
    tracing::info!(
        invoice_id,
        payment_id = payment.id,
        amount_cents = payment.amount_cents,
        "Payment recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: payment })))
}

/// DELETE /api/v1/sales/payments/{id}
pub async fn delete_payment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if PaymentRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Payment", id))
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// GET /api/v1/sales/summary?fiscal_year=
///
/// Invoice and quote rollups bucketed by fiscal year, newest first. With
/// `fiscal_year` only that year is returned.
pub async fn sales_summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<DataResponse<SalesSummary>>> {
    let settings = SettingsRepo::get(&state.pool).await?;
    let start_month = u32::try_from(settings.fiscal_year_start_month).unwrap_or(1);
    let today = Utc::now().date_naive();

    let figures: Vec<InvoiceFigures> = InvoiceRepo::list(&state.pool, None)
        .await?
        .into_iter()
        .map(|i| InvoiceFigures {
            stored_status: i.status,
            issue_date: i.issue_date,
            due_date: i.due_date,
            total_cents: i.total_cents,
            paid_cents: i.paid_cents,
        })
        .collect();
    let quotes = QuoteRepo::list(&state.pool, None).await?;

    let mut invoices = summarize_by_fiscal_year(&figures, start_month, today);
    let mut quote_counts = count_quotes(&quotes, start_month, today);
    if let Some(fy) = params.fiscal_year {
        invoices.retain(|s| s.fiscal_year == fy);
        quote_counts.retain(|q| q.fiscal_year == fy);
    }

    Ok(Json(DataResponse {
        data: SalesSummary {
            fiscal_year_start_month: settings.fiscal_year_start_month,
            invoices,
            quotes: quote_counts,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Values used for fields a request leaves out.
struct DocumentDefaults {
    status: String,
    issue_date: NaiveDate,
    currency: String,
    tax_rate_bps: i32,
}

async fn quote_fields(
    state: &AppState,
    input: QuoteRequest,
    defaults: DocumentDefaults,
) -> AppResult<QuoteFields> {
    let status = input.status.unwrap_or(defaults.status);
    validate_quote_status(&status)?;
    let currency = input.currency.unwrap_or(defaults.currency);
    validate_currency(&currency)?;
    let tax_rate_bps = input.tax_rate_bps.unwrap_or(defaults.tax_rate_bps);
    validate_line_items(&input.line_items, tax_rate_bps)?;
    let issue_date = input.issue_date.unwrap_or(defaults.issue_date);
    if input.valid_until.is_some_and(|d| d < issue_date) {
        return Err(AppError::Core(CoreError::Validation(
            "Valid-until date must not precede the issue date".into(),
        )));
    }
    check_references(state, input.client_id, input.project_id).await?;

    let totals = compute_totals(&input.line_items, tax_rate_bps)?;
    Ok(QuoteFields {
        client_id: input.client_id,
        project_id: input.project_id,
        status,
        issue_date,
        valid_until: input.valid_until,
        currency,
        line_items: input.line_items,
        tax_rate_bps,
        subtotal_cents: totals.subtotal_cents,
        tax_cents: totals.tax_cents,
        total_cents: totals.total_cents,
        notes: input.notes,
    })
}

async fn invoice_fields(
    state: &AppState,
    input: InvoiceRequest,
    quote_id: Option<DbId>,
    defaults: DocumentDefaults,
) -> AppResult<InvoiceFields> {
    let status = input.status.unwrap_or(defaults.status);
    validate_invoice_status(&status)?;
    let currency = input.currency.unwrap_or(defaults.currency);
    validate_currency(&currency)?;
    let tax_rate_bps = input.tax_rate_bps.unwrap_or(defaults.tax_rate_bps);
    validate_line_items(&input.line_items, tax_rate_bps)?;
    let issue_date = input.issue_date.unwrap_or(defaults.issue_date);
    if input.due_date.is_some_and(|d| d < issue_date) {
        return Err(AppError::Core(CoreError::Validation(
            "Due date must not precede the issue date".into(),
        )));
    }
    check_references(state, input.client_id, input.project_id).await?;

    let totals = compute_totals(&input.line_items, tax_rate_bps)?;
    Ok(InvoiceFields {
        client_id: input.client_id,
        project_id: input.project_id,
        quote_id,
        status,
        issue_date,
        due_date: input.due_date,
        currency,
        line_items: input.line_items,
        tax_rate_bps,
        subtotal_cents: totals.subtotal_cents,
        tax_cents: totals.tax_cents,
        total_cents: totals.total_cents,
        notes: input.notes,
    })
}

async fn check_references(
    state: &AppState,
    client_id: DbId,
    project_id: Option<DbId>,
) -> AppResult<()> {
    find_client(state, client_id).await?;
    if let Some(project_id) = project_id {
        ProjectRepo::find_by_id(&state.pool, project_id)
            .await?
            .ok_or(AppError::not_found("Project", project_id))?;
    }
    Ok(())
}

/// Bucket quotes by fiscal year of issue, newest year first.
fn count_quotes(quotes: &[Quote], start_month: u32, today: NaiveDate) -> Vec<QuoteCounts> {
    let mut buckets: std::collections::BTreeMap<i32, QuoteCounts> =
        std::collections::BTreeMap::new();
    for quote in quotes {
        let fy = fiscal_year_of(quote.issue_date, start_month);
        let bucket = buckets.entry(fy).or_insert_with(|| QuoteCounts {
            fiscal_year: fy,
            ..Default::default()
        });
        match quote_effective_status(&quote.status, quote.valid_until, today) {
            QUOTE_ACCEPTED => bucket.accepted += 1,
            QUOTE_DRAFT | QUOTE_SENT => bucket.open += 1,
            _ => {}
        }
    }
    buckets.into_values().rev().collect()
}

fn validate_client_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Client name must not be empty".into(),
        )));
    }
    Ok(())
}

async fn find_client(state: &AppState, id: DbId) -> AppResult<SalesClient> {
    SalesClientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("SalesClient", id))
}

async fn find_quote(state: &AppState, id: DbId) -> AppResult<Quote> {
    QuoteRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Quote", id))
}

async fn find_invoice(state: &AppState, id: DbId) -> AppResult<Invoice> {
    InvoiceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Invoice", id))
}
