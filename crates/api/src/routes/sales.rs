//! Route definitions for the `/sales` ledger.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sales;
use crate::state::AppState;

/// Routes mounted at `/sales`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /clients                  -> list_clients
/// POST   /clients                  -> create_client
/// GET    /clients/{id}             -> get_client
/// PUT    /clients/{id}             -> update_client
/// DELETE /clients/{id}             -> delete_client
///
/// GET    /quotes                   -> list_quotes (?client_id)
/// POST   /quotes                   -> create_quote
/// GET    /quotes/{id}              -> get_quote
/// PUT    /quotes/{id}              -> update_quote
/// DELETE /quotes/{id}              -> delete_quote
/// POST   /quotes/{id}/convert      -> convert_quote
///
/// GET    /invoices                 -> list_invoices (?client_id)
/// POST   /invoices                 -> create_invoice
/// GET    /invoices/{id}            -> get_invoice
/// PUT    /invoices/{id}            -> update_invoice
/// DELETE /invoices/{id}            -> delete_invoice
/// GET    /invoices/{id}/payments   -> list_payments
/// POST   /invoices/{id}/payments   -> create_payment
/// DELETE /payments/{id}            -> delete_payment
///
/// GET    /summary                  -> sales_summary (?fiscal_year)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(sales::list_clients).post(sales::create_client))
        .route(
            "/clients/{id}",
            get(sales::get_client)
                .put(sales::update_client)
                .delete(sales::delete_client),
        )
        .route("/quotes", get(sales::list_quotes).post(sales::create_quote))
        .route(
            "/quotes/{id}",
            get(sales::get_quote)
                .put(sales::update_quote)
                .delete(sales::delete_quote),
        )
        .route("/quotes/{id}/convert", post(sales::convert_quote))
        .route(
            "/invoices",
            get(sales::list_invoices).post(sales::create_invoice),
        )
        .route(
            "/invoices/{id}",
            get(sales::get_invoice)
                .put(sales::update_invoice)
                .delete(sales::delete_invoice),
        )
        .route(
            "/invoices/{id}/payments",
            get(sales::list_payments).post(sales::create_payment),
        )
        .route("/payments/{id}", delete(sales::delete_payment))
        .route("/summary", get(sales::sales_summary))
}
