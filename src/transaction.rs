//! Token purchases made by customers: the model, its table, list page and
//! mutation endpoints.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use maud::{Markup, html};
use rusqlite::{Connection, ToSql, params};
use time::Date;

use crate::{
    Error,
    dashboard::{
        DashboardState, Listed, create_form, dashboard_page, render_cached, with_url_replacement,
    },
    endpoints::{self, format_endpoint},
    form::{FormData, FormSchema, ValidationError},
    html::{
        data_row, data_table, format_currency, inline_input, inline_select, labelled_input,
        labelled_select,
    },
    mutation::{self, MutationOutcome, MutationState, Record, Target},
    search::{
        QUERY_PARAM, SEARCH_RESULTS_ID, SearchParams, contains_pattern, current_url,
        resolve_search, search_input,
    },
    status::Status,
};

/// Where transaction mutations land.
pub const TRANSACTIONS: Target = Target {
    entity: "Transaction",
    view_paths: &[endpoints::TRANSACTIONS_VIEW],
    redirect_path: endpoints::TRANSACTIONS_VIEW,
};

/// A purchase of `tokens` for `value` dollars, held in `vault`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub customer_id: String,
    pub value: f64,
    pub tokens: f64,
    pub vault: String,
    pub status: Status,
    /// The UTC calendar date of the transaction.
    pub date: Date,
}

impl FormSchema for Transaction {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            customer_id: form.text("customerId")?,
            value: form.number("value")?,
            tokens: form.number("tokens")?,
            vault: form.text("vault")?,
            status: Status::from_field(form, "status")?,
            date: form.date("date")?,
        })
    }
}

impl Record for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] =
        &["customerid", "value", "tokens", "vault", "status", "date"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![
            self.customer_id,
            self.value,
            self.tokens,
            self.vault,
            self.status,
            self.date
        ]
        .to_vec()
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            customerid TEXT NOT NULL,
            value REAL NOT NULL,
            tokens REAL NOT NULL,
            vault TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
            date TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// A transaction as listed, with the customer's name when the customer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction: Transaction,
    pub customer_name: Option<String>,
}

/// Get transactions, newest first.
///
/// A non-empty `query` keeps the transactions whose customer name, customer
/// id, vault or status contains it.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query fails.
pub fn get_transactions(
    query: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Listed<TransactionRow>>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.customerid, t.value, t.tokens, t.vault, t.status, t.date, c.name
            FROM transactions t LEFT JOIN customers c ON c.id = t.customerid
            WHERE c.name LIKE ?1 ESCAPE '\\'
                OR t.customerid LIKE ?1 ESCAPE '\\'
                OR t.vault LIKE ?1 ESCAPE '\\'
                OR t.status LIKE ?1 ESCAPE '\\'
            ORDER BY t.date DESC, t.rowid DESC",
        )?
        .query_map([contains_pattern(query)], |row| {
            Ok(Listed {
                id: row.get(0)?,
                record: TransactionRow {
                    transaction: Transaction {
                        customer_id: row.get(1)?,
                        value: row.get(2)?,
                        tokens: row.get(3)?,
                        vault: row.get(4)?,
                        status: row.get(5)?,
                        date: row.get(6)?,
                    },
                    customer_name: row.get(7)?,
                },
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn edit_fields(transaction: &Transaction) -> Markup {
    html! {
        (inline_input("Customer ID", "customerId", "text", &transaction.customer_id, true))
        (inline_input("Value", "value", "number", &transaction.value.to_string(), true))
        (inline_input("Tokens", "tokens", "number", &transaction.tokens.to_string(), true))
        (inline_input("Vault", "vault", "text", &transaction.vault, true))
        (inline_select("Status", "status", Status::OPTIONS, transaction.status.as_str()))
        (inline_input("Date", "date", "date", &transaction.date.to_string(), true))
    }
}

fn transactions_view(rows: &[Listed<TransactionRow>], params: &SearchParams) -> Markup {
    let table_rows: Vec<Markup> = rows
        .iter()
        .map(|Listed { id, record }| {
            let transaction = &record.transaction;
            data_row(
                &[
                    record
                        .customer_name
                        .clone()
                        .unwrap_or_else(|| transaction.customer_id.clone()),
                    format_currency(transaction.value),
                    transaction.tokens.to_string(),
                    transaction.vault.clone(),
                    transaction.status.to_string(),
                    transaction.date.to_string(),
                ],
                &format_endpoint(endpoints::TRANSACTION, id),
                &edit_fields(transaction),
            )
        })
        .collect();

    let fields = html! {
        (labelled_input("Customer ID", "customerId", "text", "", true))
        (labelled_input("Value", "value", "number", "", true))
        (labelled_input("Tokens", "tokens", "number", "", true))
        (labelled_input("Vault", "vault", "text", "", true))
        (labelled_select("Status", "status", Status::OPTIONS))
        (labelled_input("Date", "date", "datetime-local", "", true))
    };

    let content = html! {
        (search_input("Search transactions...", endpoints::TRANSACTIONS_VIEW, params))
        (create_form("New transaction", endpoints::TRANSACTIONS_API, &fields))
        (data_table(
            SEARCH_RESULTS_ID,
            &["Customer", "Value", "Tokens", "Vault", "Status", "Date"],
            &table_rows,
        ))
    };

    dashboard_page("Transactions", endpoints::TRANSACTIONS_VIEW, &content)
}

/// Display the transactions page, filtered by the `query` parameter.
pub async fn get_transactions_page(
    State(state): State<DashboardState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, Error> {
    let (params, replacement) = resolve_search(current_url(&headers), &params);

    let search = params.get(QUERY_PARAM);
    let page = render_cached(&state, endpoints::TRANSACTIONS_VIEW, search, |connection| {
        let rows = get_transactions(search, connection)?;
        Ok(transactions_view(&rows, &params))
    })?;

    Ok(with_url_replacement(
        page,
        replacement,
        endpoints::TRANSACTIONS_VIEW,
    ))
}

/// A route handler for creating a transaction, redirects to the transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let transaction = Transaction::parse(&form)?;

    Ok(mutation::create(&transaction, &TRANSACTIONS, &state))
}

/// A route handler for replacing every field of a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<MutationState>,
    Path(transaction_id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let transaction = Transaction::parse(&form)?;

    Ok(mutation::update(
        &transaction_id,
        &transaction,
        &TRANSACTIONS,
        &state,
    ))
}

/// A route handler for deleting a transaction from the transactions view.
pub async fn delete_transaction_endpoint(
    State(state): State<MutationState>,
    Path(transaction_id): Path<String>,
) -> MutationOutcome {
    mutation::delete(
        &transaction_id,
        Transaction::TABLE,
        &TRANSACTIONS,
        &state,
    )
}



#[cfg(test)]
mod page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        dashboard::DashboardState,
        db::initialize,
        search::SearchParams,
        test_utils::{assert_valid_html, get_header, parse_html_document},
        view_cache::ViewCache,
    };

    use super::{get_transactions, get_transactions_page};

    fn get_state() -> DashboardState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO customers (id, name) VALUES ('c-1', 'Acme Corp'), ('c-2', 'Zeta Ltd')",
                (),
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO transactions (customerid, value, tokens, vault, status, date)
                VALUES ('c-1', 10, 1, 'main', 'paid', '2024-03-05'),
                       ('c-2', 20, 2, 'cold', 'pending', '2024-03-06')",
                (),
            )
            .unwrap();

        DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            view_cache: ViewCache::new(),
        }
    }

    fn first_cells(html: &scraper::Html) -> Vec<String> {
        let row_selector = Selector::parse("#search-results tbody tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        html.select(&row_selector)
            .filter_map(|row| row.select(&cell_selector).next())
            .map(|cell| cell.text().collect::<String>())
            .collect()
    }

    #[tokio::test]
    async fn lists_transactions_with_customer_names() {
        let response = get_transactions_page(
            State(get_state()),
            HeaderMap::new(),
            Query(SearchParams::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(first_cells(&html), ["Zeta Ltd", "Acme Corp"]);
    }

    #[tokio::test]
    async fn htmx_search_filters_and_replaces_url() {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", "true".parse().unwrap());
        headers.insert(
            "hx-current-url",
            "http://localhost:3000/dashboard/transactions".parse().unwrap(),
        );

        let response = get_transactions_page(
            State(get_state()),
            headers,
            Query(SearchParams::parse("query=acme")),
        )
        .await
        .unwrap();

        assert_eq!(
            get_header(&response, "hx-replace-url"),
            "/dashboard/transactions?query=acme"
        );
        let html = parse_html_document(response).await;
        assert_eq!(first_cells(&html), ["Acme Corp"]);
    }

    #[tokio::test]
    async fn rows_carry_prefilled_edit_forms() {
        let response = get_transactions_page(
            State(get_state()),
            HeaderMap::new(),
            Query(SearchParams::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let edit_urls: Vec<&str> = html
            .select(&Selector::parse("#search-results form").unwrap())
            .filter_map(|form| form.value().attr("hx-put"))
            .collect();
        assert_eq!(edit_urls.len(), 2);
        assert!(edit_urls.iter().all(|url| url.starts_with("/api/transactions/")));

        let selected: Vec<String> = html
            .select(&Selector::parse("#search-results option[selected]").unwrap())
            .map(|option| option.text().collect())
            .collect();
        assert_eq!(selected, ["pending", "paid"]);
    }

    #[test]
    fn wildcard_search_matches_nothing() {
        let state = get_state();
        let connection = state.db_connection.lock().unwrap();

        assert!(get_transactions(Some("_"), &connection).unwrap().is_empty());
        assert!(get_transactions(Some("%"), &connection).unwrap().is_empty());
    }
}
