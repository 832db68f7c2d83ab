//! Movements of funds and tokens in or out of a customer's holdings.

use axum::{
    Form,
    extract::{Path, State},
    response::Html,
};
use maud::{Markup, html};
use rusqlite::{Connection, ToSql, params};

use crate::{
    Error,
    dashboard::{DashboardState, Listed, create_form, dashboard_page, render_cached},
    endpoints::{self, format_endpoint},
    form::{FormData, FormSchema, ValidationError},
    html::{
        data_row, data_table, format_currency, inline_input, inline_select, labelled_input,
        labelled_select,
    },
    mutation::{self, MutationOutcome, MutationState, Record, Target},
    search::SEARCH_RESULTS_ID,
    status::Status,
};

pub const MOVEMENTS: Target = Target {
    entity: "Movement",
    view_paths: &[endpoints::MOVEMENTS_VIEW],
    redirect_path: endpoints::MOVEMENTS_VIEW,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub customer_id: String,
    pub value: f64,
    pub tokens: f64,
    pub status: Status,
    /// Stored as submitted.
    pub date: String,
}

impl FormSchema for Movement {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            customer_id: form.text("customerId")?,
            value: form.number("value")?,
            tokens: form.number("tokens")?,
            status: Status::from_field(form, "status")?,
            date: form.text("date")?,
        })
    }
}

impl Record for Movement {
    const TABLE: &'static str = "movements";
    const COLUMNS: &'static [&'static str] = &["customerid", "value", "tokens", "status", "date"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![
            self.customer_id,
            self.value,
            self.tokens,
            self.status,
            self.date
        ]
        .to_vec()
    }
}

pub fn create_movement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS movements (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            customerid TEXT NOT NULL,
            value REAL NOT NULL,
            tokens REAL NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
            date TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn get_movements(connection: &Connection) -> Result<Vec<Listed<Movement>>, Error> {
    connection
        .prepare(
            "SELECT id, customerid, value, tokens, status, date FROM movements
            ORDER BY date DESC, rowid DESC",
        )?
        .query_map([], |row| {
            Ok(Listed {
                id: row.get(0)?,
                record: Movement {
                    customer_id: row.get(1)?,
                    value: row.get(2)?,
                    tokens: row.get(3)?,
                    status: row.get(4)?,
                    date: row.get(5)?,
                },
            })
        })?
        .map(|maybe_movement| maybe_movement.map_err(Error::from))
        .collect()
}

fn edit_fields(movement: &Movement) -> Markup {
    html! {
        (inline_input("Customer ID", "customerId", "text", &movement.customer_id, true))
        (inline_input("Value", "value", "number", &movement.value.to_string(), true))
        (inline_input("Tokens", "tokens", "number", &movement.tokens.to_string(), true))
        (inline_select("Status", "status", Status::OPTIONS, movement.status.as_str()))
        (inline_input("Date", "date", "date", &movement.date, true))
    }
}

fn movements_view(movements: &[Listed<Movement>]) -> Markup {
    let rows: Vec<Markup> = movements
        .iter()
        .map(|Listed { id, record }| {
            data_row(
                &[
                    record.customer_id.clone(),
                    format_currency(record.value),
                    record.tokens.to_string(),
                    record.status.to_string(),
                    record.date.clone(),
                ],
                &format_endpoint(endpoints::MOVEMENT, id),
                &edit_fields(record),
            )
        })
        .collect();

    let fields = html! {
        (labelled_input("Customer ID", "customerId", "text", "", true))
        (labelled_input("Value", "value", "number", "", true))
        (labelled_input("Tokens", "tokens", "number", "", true))
        (labelled_select("Status", "status", Status::OPTIONS))
        (labelled_input("Date", "date", "date", "", true))
    };

    let content = html! {
        (create_form("New movement", endpoints::MOVEMENTS_API, &fields))
        (data_table(
            SEARCH_RESULTS_ID,
            &["Customer", "Value", "Tokens", "Status", "Date"],
            &rows,
        ))
    };

    dashboard_page("Movements", endpoints::MOVEMENTS_VIEW, &content)
}

pub async fn get_movements_page(
    State(state): State<DashboardState>,
) -> Result<Html<String>, Error> {
    render_cached(&state, endpoints::MOVEMENTS_VIEW, None, |connection| {
        Ok(movements_view(&get_movements(connection)?))
    })
}

pub async fn create_movement_endpoint(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let movement = Movement::parse(&form)?;

    Ok(mutation::create(&movement, &MOVEMENTS, &state))
}

pub async fn update_movement_endpoint(
    State(state): State<MutationState>,
    Path(movement_id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let movement = Movement::parse(&form)?;

    Ok(mutation::update(&movement_id, &movement, &MOVEMENTS, &state))
}

pub async fn delete_movement_endpoint(
    State(state): State<MutationState>,
    Path(movement_id): Path<String>,
) -> MutationOutcome {
    mutation::delete(&movement_id, Movement::TABLE, &MOVEMENTS, &state)
}
