//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/customers/{customer_id}', use [format_endpoint].

/// The root route which redirects to the transactions view.
pub const ROOT: &str = "/";
/// The page listing transactions.
pub const TRANSACTIONS_VIEW: &str = "/dashboard/transactions";
/// The page listing invoices.
pub const INVOICES_VIEW: &str = "/dashboard/invoices";
/// The page listing fund movements.
pub const MOVEMENTS_VIEW: &str = "/dashboard/movements";
/// The page listing customers.
pub const CUSTOMERS_VIEW: &str = "/dashboard/customers";
/// The page listing token prices.
pub const FUNDS_VIEW: &str = "/dashboard/funds";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/login";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create invoices.
pub const INVOICES_API: &str = "/api/invoices";
/// The route to update or delete a single invoice.
pub const INVOICE: &str = "/api/invoices/{invoice_id}";
/// The route to create movements.
pub const MOVEMENTS_API: &str = "/api/movements";
/// The route to update or delete a single movement.
pub const MOVEMENT: &str = "/api/movements/{movement_id}";
/// The route to create customers.
pub const CUSTOMERS_API: &str = "/api/customers";
/// The route to update or delete a single customer.
pub const CUSTOMER: &str = "/api/customers/{customer_id}";
/// The route to create token prices.
pub const TOKEN_PRICES_API: &str = "/api/token_prices";
/// The route to update or delete a single token price.
pub const TOKEN_PRICE: &str = "/api/token_prices/{token_price_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace and ends with a
/// right brace. For example, in the endpoint path '/api/customers/{customer_id}',
/// '{customer_id}' is the parameter.
///
/// Only the first parameter is replaced. If no parameter is found in
/// `endpoint_path`, the function returns the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
