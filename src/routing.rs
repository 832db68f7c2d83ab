//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    customer::{
        create_customer_endpoint, delete_customer_endpoint, get_customers_page,
        update_customer_endpoint,
    },
    endpoints,
    invoice::{
        create_invoice_endpoint, delete_invoice_endpoint, get_invoices_page,
        update_invoice_endpoint,
    },
    movement::{
        create_movement_endpoint, delete_movement_endpoint, get_movements_page,
        update_movement_endpoint,
    },
    not_found::get_404_not_found,
    token_price::{
        create_token_price_endpoint, delete_token_price_endpoint, get_funds_page,
        update_token_price_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_page,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user));

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::INVOICES_VIEW, get(get_invoices_page))
        .route(endpoints::MOVEMENTS_VIEW, get(get_movements_page))
        .route(endpoints::CUSTOMERS_VIEW, get(get_customers_page))
        .route(endpoints::FUNDS_VIEW, get(get_funds_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::INVOICES_API, post(create_invoice_endpoint))
            .route(
                endpoints::INVOICE,
                put(update_invoice_endpoint).delete(delete_invoice_endpoint),
            )
            .route(endpoints::MOVEMENTS_API, post(create_movement_endpoint))
            .route(
                endpoints::MOVEMENT,
                put(update_movement_endpoint).delete(delete_movement_endpoint),
            )
            .route(endpoints::CUSTOMERS_API, post(create_customer_endpoint))
            .route(
                endpoints::CUSTOMER,
                put(update_customer_endpoint).delete(delete_customer_endpoint),
            )
            .route(
                endpoints::TOKEN_PRICES_API,
                post(create_token_price_endpoint),
            )
            .route(
                endpoints::TOKEN_PRICE,
                put(update_token_price_endpoint).delete(delete_token_price_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}
