//! Sales ledger calculations: line-item totals, effective document
//! status, balances, and fiscal-year bucketing.
//!
//! All money is integer minor units (cents). Tax rates are basis points
//! (`2000` = 20%).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Status constants
-------------------------------------------------------------------------- */

pub const INVOICE_DRAFT: &str = "draft";
pub const INVOICE_SENT: &str = "sent";
pub const INVOICE_CANCELLED: &str = "cancelled";

/// Stored invoice statuses. Everything else is derived.
pub const VALID_INVOICE_STATUSES: &[&str] = &[INVOICE_DRAFT, INVOICE_SENT, INVOICE_CANCELLED];

pub const INVOICE_EFFECTIVE_OPEN: &str = "open";
pub const INVOICE_EFFECTIVE_PAID: &str = "paid";
pub const INVOICE_EFFECTIVE_PARTIALLY_PAID: &str = "partially_paid";
pub const INVOICE_EFFECTIVE_OVERDUE: &str = "overdue";

pub const QUOTE_DRAFT: &str = "draft";
pub const QUOTE_SENT: &str = "sent";
pub const QUOTE_ACCEPTED: &str = "accepted";
pub const QUOTE_REJECTED: &str = "rejected";

pub const VALID_QUOTE_STATUSES: &[&str] = &[QUOTE_DRAFT, QUOTE_SENT, QUOTE_ACCEPTED, QUOTE_REJECTED];

pub const QUOTE_EFFECTIVE_EXPIRED: &str = "expired";

pub const QUOTE_NUMBER_PREFIX: &str = "Q";
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Upper bound on a tax rate (100%).
pub const MAX_TAX_RATE_BPS: i32 = 10_000;

/// Largest unit price on a line item.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;

pub const MAX_QUANTITY: f64 = 1_000_000.0;

/// Largest document total or single payment the ledger accepts.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;

pub fn validate_invoice_status(status: &str) -> Result<(), CoreError> {
    if VALID_INVOICE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid invoice status '{status}'. Must be one of: {}",
            VALID_INVOICE_STATUSES.join(", ")
        )))
    }
}

pub fn validate_quote_status(status: &str) -> Result<(), CoreError> {
    if VALID_QUOTE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid quote status '{status}'. Must be one of: {}",
            VALID_QUOTE_STATUSES.join(", ")
        )))
    }
}

/* --------------------------------------------------------------------------
Line items and totals
-------------------------------------------------------------------------- */

/// One billable line on a quote or invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
}

impl LineItem {
    /// `quantity * unit_price`, rounded half away from zero.
    pub fn total_cents(&self) -> i64 {
        (self.quantity * self.unit_price_cents as f64).round() as i64
    }
}

/// Computed totals of a sales document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Validate line items and the tax rate before totals are computed.
pub fn validate_line_items(items: &[LineItem], tax_rate_bps: i32) -> Result<(), CoreError> {
    if !(0..=MAX_TAX_RATE_BPS).contains(&tax_rate_bps) {
        return Err(CoreError::Validation(format!(
            "Tax rate must be between 0 and {MAX_TAX_RATE_BPS} basis points"
        )));
    }
    for (i, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Line item {} needs a description",
                i + 1
            )));
        }
        if !item.quantity.is_finite() || item.quantity <= 0.0 || item.quantity > MAX_QUANTITY {
            return Err(CoreError::Validation(format!(
                "Line item {} must have a quantity between 0 and {MAX_QUANTITY}",
                i + 1
            )));
        }
        if !(0..=MAX_UNIT_PRICE_CENTS).contains(&item.unit_price_cents) {
            return Err(CoreError::Validation(format!(
                "Line item {} must have a price between 0 and {MAX_UNIT_PRICE_CENTS} cents",
                i + 1
            )));
        }
    }
    Ok(())
}

/// Sum line items and apply tax to the subtotal.
///
/// Fails when the total would exceed [`MAX_AMOUNT_CENTS`].
pub fn compute_totals(items: &[LineItem], tax_rate_bps: i32) -> Result<DocumentTotals, CoreError> {
    let too_large = || {
        CoreError::Validation(format!(
            "Document total exceeds the maximum of {MAX_AMOUNT_CENTS} cents"
        ))
    };
    let subtotal_cents = items
        .iter()
        .try_fold(0i64, |sum, item| sum.checked_add(item.total_cents()))
        .ok_or_else(too_large)?;
    let tax_cents = div_round(subtotal_cents as i128 * tax_rate_bps as i128, 10_000);
    let total_cents = subtotal_cents
        .checked_add(tax_cents)
        .filter(|total| *total <= MAX_AMOUNT_CENTS)
        .ok_or_else(too_large)?;
    Ok(DocumentTotals {
        subtotal_cents,
        tax_cents,
        total_cents,
    })
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let q = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    q as i64
}

/// Outstanding amount on an invoice. Negative means overpaid.
pub fn balance_cents(total_cents: i64, paid_cents: i64) -> i64 {
    total_cents - paid_cents
}

/* --------------------------------------------------------------------------
Effective status
-------------------------------------------------------------------------- */

/// Derive what an invoice looks like today from its stored status,
/// payments, and due date.
pub fn invoice_effective_status(
    stored: &str,
    total_cents: i64,
    paid_cents: i64,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> &'static str {
    if stored == INVOICE_CANCELLED {
        return INVOICE_CANCELLED;
    }
    if stored == INVOICE_DRAFT {
        return INVOICE_DRAFT;
    }
    let balance = balance_cents(total_cents, paid_cents);
    if balance <= 0 && (total_cents > 0 || paid_cents > 0) {
        return INVOICE_EFFECTIVE_PAID;
    }
    if due_date.is_some_and(|due| due < today) {
        return INVOICE_EFFECTIVE_OVERDUE;
    }
    if paid_cents > 0 {
        return INVOICE_EFFECTIVE_PARTIALLY_PAID;
    }
    INVOICE_EFFECTIVE_OPEN
}

/// Derive a quote's status today: unanswered quotes past their validity
/// date are expired.
pub fn quote_effective_status(
    stored: &str,
    valid_until: Option<NaiveDate>,
    today: NaiveDate,
) -> &'static str {
    match stored {
        QUOTE_ACCEPTED => QUOTE_ACCEPTED,
        QUOTE_REJECTED => QUOTE_REJECTED,
        _ if valid_until.is_some_and(|d| d < today) => QUOTE_EFFECTIVE_EXPIRED,
        QUOTE_SENT => QUOTE_SENT,
        _ => QUOTE_DRAFT,
    }
}

/* --------------------------------------------------------------------------
Fiscal years
-------------------------------------------------------------------------- */

/// Validate a fiscal-year start month (1-12).
pub fn validate_fiscal_start_month(month: i16) -> Result<(), CoreError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Fiscal year start month must be between 1 and 12".to_string(),
        ))
    }
}

/// Fiscal year containing `date`, labelled by the calendar year in which
/// it ends. With a January start this is simply the calendar year.
pub fn fiscal_year_of(date: NaiveDate, start_month: u32) -> i32 {
    if start_month <= 1 || date.month() < start_month {
        date.year()
    } else {
        date.year() + 1
    }
}

/// First and last day (inclusive) of fiscal year `fy`.
pub fn fiscal_year_bounds(fy: i32, start_month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start_year = if start_month <= 1 { fy } else { fy - 1 };
    let start = NaiveDate::from_ymd_opt(start_year, start_month.max(1), 1)?;
    let next = NaiveDate::from_ymd_opt(start_year + 1, start_month.max(1), 1)?;
    Some((start, next.pred_opt()?))
}

/// Render a document number, e.g. `INV-0042`.
pub fn format_document_number(prefix: &str, seq: i32) -> String {
    format!("{prefix}-{seq:04}")
}

/* --------------------------------------------------------------------------
Rollups
-------------------------------------------------------------------------- */

/// The figures of one invoice needed for reporting.
#[derive(Debug, Clone)]
pub struct InvoiceFigures {
    pub stored_status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_cents: i64,
    pub paid_cents: i64,
}

/// Aggregated invoice figures for one fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FiscalYearSummary {
    pub fiscal_year: i32,
    pub invoice_count: i64,
    pub invoiced_cents: i64,
    pub collected_cents: i64,
    pub outstanding_cents: i64,
    pub overdue_count: i64,
    pub overdue_cents: i64,
}

/// Bucket invoices by the fiscal year of their issue date.
///
/// Draft and cancelled invoices are excluded. Buckets come back sorted
/// newest year first.
pub fn summarize_by_fiscal_year(
    invoices: &[InvoiceFigures],
    start_month: u32,
    today: NaiveDate,
) -> Vec<FiscalYearSummary> {
    let mut buckets: std::collections::BTreeMap<i32, FiscalYearSummary> =
        std::collections::BTreeMap::new();

    for inv in invoices {
        if inv.stored_status == INVOICE_DRAFT || inv.stored_status == INVOICE_CANCELLED {
            continue;
        }
        let fy = fiscal_year_of(inv.issue_date, start_month);
        let bucket = buckets.entry(fy).or_insert_with(|| FiscalYearSummary {
            fiscal_year: fy,
            ..Default::default()
        });
        let balance = balance_cents(inv.total_cents, inv.paid_cents).max(0);
        bucket.invoice_count += 1;
        bucket.invoiced_cents += inv.total_cents;
        bucket.collected_cents += inv.paid_cents;
        bucket.outstanding_cents += balance;

        let effective = invoice_effective_status(
            &inv.stored_status,
            inv.total_cents,
            inv.paid_cents,
            inv.due_date,
            today,
        );
        if effective == INVOICE_EFFECTIVE_OVERDUE {
            bucket.overdue_count += 1;
            bucket.overdue_cents += balance;
        }
    }

    buckets.into_values().rev().collect()
}
