//! Customers, the people and businesses that transactions, invoices and
//! movements refer to.
//!
//! Deleting a customer leaves their transactions, invoices and movements in
//! place; nothing checks or cascades references.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use maud::{Markup, html};
use rusqlite::{Connection, ToSql, params};

use crate::{
    Error,
    dashboard::{
        DashboardState, Listed, create_form, dashboard_page, render_cached, with_url_replacement,
    },
    endpoints::{self, format_endpoint},
    form::{FormData, FormSchema, ValidationError},
    html::{data_row, data_table, inline_input, labelled_input},
    mutation::{self, MutationOutcome, MutationState, Record, Target},
    search::{
        QUERY_PARAM, SEARCH_RESULTS_ID, SearchParams, contains_pattern, current_url,
        resolve_search, search_input,
    },
};

/// Where customer mutations land.
///
/// The transactions page shows customer names, so it is revalidated too.
pub const CUSTOMERS: Target = Target {
    entity: "Customer",
    view_paths: &[endpoints::CUSTOMERS_VIEW, endpoints::TRANSACTIONS_VIEW],
    redirect_path: endpoints::CUSTOMERS_VIEW,
};

/// The shortest customer name accepted, in characters.
pub const MIN_NAME_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

impl FormSchema for Customer {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            name: form.min_length("name", MIN_NAME_LENGTH)?,
            email: form.optional_email("email")?,
            image_url: form.optional_text("image_url"),
        })
    }
}

impl Record for Customer {
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &["name", "email", "image_url"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![self.name, self.email, self.image_url].to_vec()
    }
}

pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            name TEXT NOT NULL,
            email TEXT,
            image_url TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Get customers ordered by name.
///
/// A non-empty `query` keeps the customers whose name or email contains it.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query fails.
pub fn get_customers(
    query: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Listed<Customer>>, Error> {
    connection
        .prepare(
            "SELECT id, name, email, image_url FROM customers
            WHERE name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
            ORDER BY name",
        )?
        .query_map([contains_pattern(query)], |row| {
            Ok(Listed {
                id: row.get(0)?,
                record: Customer {
                    name: row.get(1)?,
                    email: row.get(2)?,
                    image_url: row.get(3)?,
                },
            })
        })?
        .map(|maybe_customer| maybe_customer.map_err(Error::from))
        .collect()
}

fn edit_fields(customer: &Customer) -> Markup {
    html! {
        (inline_input("Name", "name", "text", &customer.name, true))
        (inline_input(
            "Email",
            "email",
            "email",
            customer.email.as_deref().unwrap_or_default(),
            false
        ))
        (inline_input(
            "Image URL",
            "image_url",
            "url",
            customer.image_url.as_deref().unwrap_or_default(),
            false
        ))
    }
}

fn customers_view(customers: &[Listed<Customer>], params: &SearchParams) -> Markup {
    let rows: Vec<Markup> = customers
        .iter()
        .map(|Listed { id, record }| {
            data_row(
                &[
                    record.name.clone(),
                    record.email.clone().unwrap_or_default(),
                    record.image_url.clone().unwrap_or_default(),
                ],
                &format_endpoint(endpoints::CUSTOMER, id),
                &edit_fields(record),
            )
        })
        .collect();

    let fields = html! {
        (labelled_input("Name", "name", "text", "", true))
        (labelled_input("Email", "email", "email", "", false))
        (labelled_input("Image URL", "image_url", "url", "", false))
    };

    let content = html! {
        (search_input("Search customers...", endpoints::CUSTOMERS_VIEW, params))
        (create_form("New customer", endpoints::CUSTOMERS_API, &fields))
        (data_table(SEARCH_RESULTS_ID, &["Name", "Email", "Image"], &rows))
    };

    dashboard_page("Customers", endpoints::CUSTOMERS_VIEW, &content)
}

/// Display the customers page, filtered by the `query` parameter.
pub async fn get_customers_page(
    State(state): State<DashboardState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, Error> {
    let (params, replacement) = resolve_search(current_url(&headers), &params);

    let search = params.get(QUERY_PARAM);
    let page = render_cached(&state, endpoints::CUSTOMERS_VIEW, search, |connection| {
        let customers = get_customers(search, connection)?;
        Ok(customers_view(&customers, &params))
    })?;

    Ok(with_url_replacement(
        page,
        replacement,
        endpoints::CUSTOMERS_VIEW,
    ))
}

pub async fn create_customer_endpoint(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let customer = Customer::parse(&form)?;

    Ok(mutation::create(&customer, &CUSTOMERS, &state))
}

pub async fn update_customer_endpoint(
    State(state): State<MutationState>,
    Path(customer_id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let customer = Customer::parse(&form)?;

    Ok(mutation::update(&customer_id, &customer, &CUSTOMERS, &state))
}

pub async fn delete_customer_endpoint(
    State(state): State<MutationState>,
    Path(customer_id): Path<String>,
) -> MutationOutcome {
    mutation::delete(&customer_id, Customer::TABLE, &CUSTOMERS, &state)
}
