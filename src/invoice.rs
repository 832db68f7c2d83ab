//! Invoices billed to customers.
//!
//! Amounts are entered in dollars and stored as whole cents. The invoice date is
//! set by the server when the invoice is created and is left alone by updates.

use axum::{
    Form,
    extract::{Path, State},
    response::Html,
};
use maud::{Markup, html};
use rusqlite::{Connection, ToSql, params};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    dashboard::{DashboardState, Listed, create_form, dashboard_page, render_cached},
    endpoints::{self, format_endpoint},
    form::{Expected, FormData, FormSchema, ValidationError},
    html::{
        data_row, data_table, format_currency, inline_input, inline_select, labelled_input,
        labelled_select,
    },
    mutation::{self, MutationOutcome, MutationState, Record, Target},
    search::SEARCH_RESULTS_ID,
    status::Status,
};

/// Where invoice mutations land.
pub const INVOICES: Target = Target {
    entity: "Invoice",
    view_paths: &[endpoints::INVOICES_VIEW],
    redirect_path: endpoints::INVOICES_VIEW,
};

/// The client-editable fields of an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub customer_id: String,
    /// The amount in cents.
    pub amount: i64,
    pub status: Status,
}

/// Convert a dollar amount to whole cents, rounding to the nearest cent.
///
/// Returns `None` when the cents do not fit in an `i64`.
pub fn to_cents(amount: f64) -> Option<i64> {
    let cents = (amount * 100.0).round();

    // i64::MAX rounds up to 2^63 as a float, which is already out of range.
    (cents >= i64::MIN as f64 && cents < i64::MAX as f64).then_some(cents as i64)
}

fn to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

impl FormSchema for Invoice {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            customer_id: form.text("customerId")?,
            amount: to_cents(form.number("amount")?)
                .ok_or_else(|| ValidationError::new("amount", Expected::Number))?,
            status: Status::from_field(form, "status")?,
        })
    }
}

impl Record for Invoice {
    const TABLE: &'static str = "invoices";
    const COLUMNS: &'static [&'static str] = &["customer_id", "amount", "status"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![self.customer_id, self.amount, self.status].to_vec()
    }
}

/// An invoice about to be inserted, dated today (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub invoice: Invoice,
    pub date: Date,
}

impl NewInvoice {
    pub fn dated_today(invoice: Invoice) -> Self {
        Self {
            invoice,
            date: OffsetDateTime::now_utc().date(),
        }
    }
}

impl Record for NewInvoice {
    const TABLE: &'static str = Invoice::TABLE;
    const COLUMNS: &'static [&'static str] = &["customer_id", "amount", "status", "date"];

    fn params(&self) -> Vec<&dyn ToSql> {
        let mut params = self.invoice.params();
        params.push(&self.date);
        params
    }
}

pub fn create_invoice_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            customer_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
            date TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Get every invoice, newest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query fails.
pub fn get_invoices(connection: &Connection) -> Result<Vec<Listed<NewInvoice>>, Error> {
    connection
        .prepare(
            "SELECT id, customer_id, amount, status, date FROM invoices
            ORDER BY date DESC, rowid DESC",
        )?
        .query_map([], |row| {
            Ok(Listed {
                id: row.get(0)?,
                record: NewInvoice {
                    invoice: Invoice {
                        customer_id: row.get(1)?,
                        amount: row.get(2)?,
                        status: row.get(3)?,
                    },
                    date: row.get(4)?,
                },
            })
        })?
        .map(|maybe_invoice| maybe_invoice.map_err(Error::from))
        .collect()
}

fn edit_fields(invoice: &Invoice) -> Markup {
    let amount = format!("{:.2}", to_dollars(invoice.amount));

    html! {
        (inline_input("Customer ID", "customerId", "text", &invoice.customer_id, true))
        (inline_input("Amount", "amount", "number", &amount, true))
        (inline_select("Status", "status", Status::OPTIONS, invoice.status.as_str()))
    }
}

fn invoices_view(invoices: &[Listed<NewInvoice>]) -> Markup {
    let rows: Vec<Markup> = invoices
        .iter()
        .map(|Listed { id, record }| {
            data_row(
                &[
                    record.invoice.customer_id.clone(),
                    format_currency(to_dollars(record.invoice.amount)),
                    record.invoice.status.to_string(),
                    record.date.to_string(),
                ],
                &format_endpoint(endpoints::INVOICE, id),
                &edit_fields(&record.invoice),
            )
        })
        .collect();

    let fields = html! {
        (labelled_input("Customer ID", "customerId", "text", "", true))
        (labelled_input("Amount", "amount", "number", "", true))
        (labelled_select("Status", "status", Status::OPTIONS))
    };

    let content = html! {
        (create_form("New invoice", endpoints::INVOICES_API, &fields))
        (data_table(SEARCH_RESULTS_ID, &["Customer", "Amount", "Status", "Date"], &rows))
    };

    dashboard_page("Invoices", endpoints::INVOICES_VIEW, &content)
}

/// Display the invoices page.
pub async fn get_invoices_page(
    State(state): State<DashboardState>,
) -> Result<Html<String>, Error> {
    render_cached(&state, endpoints::INVOICES_VIEW, None, |connection| {
        Ok(invoices_view(&get_invoices(connection)?))
    })
}

/// A route handler for creating an invoice dated today.
pub async fn create_invoice_endpoint(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let invoice = NewInvoice::dated_today(Invoice::parse(&form)?);

    Ok(mutation::create(&invoice, &INVOICES, &state))
}

/// A route handler for updating the customer, amount and status of an invoice.
pub async fn update_invoice_endpoint(
    State(state): State<MutationState>,
    Path(invoice_id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let invoice = Invoice::parse(&form)?;

    Ok(mutation::update(&invoice_id, &invoice, &INVOICES, &state))
}

pub async fn delete_invoice_endpoint(
    State(state): State<MutationState>,
    Path(invoice_id): Path<String>,
) -> MutationOutcome {
    mutation::delete(&invoice_id, Invoice::TABLE, &INVOICES, &state)
}


#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        Error,
        db::initialize,
        endpoints,
        form::{Expected, FormData, ValidationError},
        mutation::{MutationOutcome, MutationState},
        view_cache::ViewCache,
    };

    use super::{
        create_invoice_endpoint, delete_invoice_endpoint, get_invoices, update_invoice_endpoint,
    };

    fn get_state() -> MutationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        MutationState {
            db_connection: Arc::new(Mutex::new(connection)),
            view_cache: ViewCache::new(),
        }
    }

    fn form(amount: &str, status: &str) -> Form<FormData> {
        Form(FormData::from([
            ("customerId", "c-1"),
            ("amount", amount),
            ("status", status),
        ]))
    }

    #[tokio::test]
    async fn create_stores_cents_and_todays_date() {
        let state = get_state();

        let outcome = create_invoice_endpoint(State(state.clone()), form("12.50", "pending"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Redirect {
                path: endpoints::INVOICES_VIEW
            }
        );
        let (amount, date): (i64, String) = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT amount, date FROM invoices", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(amount, 1250);
        assert_eq!(date, OffsetDateTime::now_utc().date().to_string());
    }

    #[tokio::test]
    async fn update_keeps_original_date() {
        let state = get_state();
        state
            .db_connection
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO invoices (id, customer_id, amount, status, date)
                VALUES ('inv-1', 'c-1', 500, 'pending', '2023-01-31')",
                (),
            )
            .unwrap();

        update_invoice_endpoint(
            State(state.clone()),
            Path("inv-1".to_owned()),
            form("7.25", "paid"),
        )
        .await
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let invoices = get_invoices(&connection).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].record.invoice.amount, 725);
        assert_eq!(invoices[0].record.invoice.status.as_str(), "paid");
        assert_eq!(invoices[0].record.date.to_string(), "2023-01-31");
    }

    #[tokio::test]
    async fn delete_revalidates_without_redirect() {
        let state = get_state();
        create_invoice_endpoint(State(state.clone()), form("1", "paid"))
            .await
            .unwrap();
        let id = get_invoices(&state.db_connection.lock().unwrap()).unwrap()[0]
            .id
            .clone();

        let outcome = delete_invoice_endpoint(State(state.clone()), Path(id)).await;

        assert_eq!(outcome, MutationOutcome::Revalidated { entity: "Invoice" });
        assert!(
            get_invoices(&state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn empty_amount_is_rejected() {
        let state = get_state();

        let result = create_invoice_endpoint(State(state), form("", "paid")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn amount_too_large_for_cents_is_rejected() {
        let state = get_state();

        let result = create_invoice_endpoint(State(state.clone()), form("1e30", "paid")).await;

        assert_eq!(
            result.unwrap_err(),
            Error::Validation(ValidationError::new("amount", Expected::Number))
        );
        assert!(
            get_invoices(&state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
