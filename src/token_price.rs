//! Token prices shown on the funds page.

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
    html::{data_row, data_table, format_currency, inline_input, labelled_input},
    mutation::{self, MutationOutcome, MutationState, Record, Target},
    search::SEARCH_RESULTS_ID,
};

/// Where token price mutations land.
pub const TOKEN_PRICES: Target = Target {
    entity: "Token Price",
    view_paths: &[endpoints::FUNDS_VIEW],
    redirect_path: endpoints::FUNDS_VIEW,
};

/// The price of one token on a given date.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrice {
    pub date: String,
    pub token_name: String,
    pub price: f64,
}

impl FormSchema for TokenPrice {
    fn parse(form: &FormData) -> Result<Self, ValidationError> {
        Ok(Self {
            date: form.text("date")?,
            token_name: form.text("tokenname")?,
            price: form.number("price")?,
        })
    }
}

impl Record for TokenPrice {
    const TABLE: &'static str = "tokenprices";
    const COLUMNS: &'static [&'static str] = &["date", "tokenname", "price"];

    fn params(&self) -> Vec<&dyn ToSql> {
        params![self.date, self.token_name, self.price].to_vec()
    }
}

pub fn create_token_price_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS tokenprices (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            date TEXT NOT NULL,
            tokenname TEXT NOT NULL,
            price REAL NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn get_token_prices(connection: &Connection) -> Result<Vec<Listed<TokenPrice>>, Error> {
    connection
        .prepare(
            "SELECT id, date, tokenname, price FROM tokenprices
            ORDER BY date DESC, tokenname",
        )?
        .query_map([], |row| {
            Ok(Listed {
                id: row.get(0)?,
                record: TokenPrice {
                    date: row.get(1)?,
                    token_name: row.get(2)?,
                    price: row.get(3)?,
                },
            })
        })?
        .map(|maybe_price| maybe_price.map_err(Error::from))
        .collect()
}

fn edit_fields(price: &TokenPrice) -> Markup {
    html! {
        (inline_input("Date", "date", "date", &price.date, true))
        (inline_input("Token", "tokenname", "text", &price.token_name, true))
        (inline_input("Price", "price", "number", &price.price.to_string(), true))
    }
}

fn funds_view(prices: &[Listed<TokenPrice>]) -> Markup {
    let rows: Vec<Markup> = prices
        .iter()
        .map(|Listed { id, record }| {
            data_row(
                &[
                    record.date.clone(),
                    record.token_name.clone(),
                    format_currency(record.price),
                ],
                &format_endpoint(endpoints::TOKEN_PRICE, id),
                &edit_fields(record),
            )
        })
        .collect();

    let fields = html! {
        (labelled_input("Date", "date", "date", "", true))
        (labelled_input("Token", "tokenname", "text", "", true))
        (labelled_input("Price", "price", "number", "", true))
    };

    let content = html! {
        (create_form("New token price", endpoints::TOKEN_PRICES_API, &fields))
        (data_table(SEARCH_RESULTS_ID, &["Date", "Token", "Price"], &rows))
    };

    dashboard_page("Funds", endpoints::FUNDS_VIEW, &content)
}

/// Display the funds page with the recorded token prices.
pub async fn get_funds_page(
    State(state): State<DashboardState>,
) -> Result<Html<String>, Error> {
    render_cached(&state, endpoints::FUNDS_VIEW, None, |connection| {
        Ok(funds_view(&get_token_prices(connection)?))
    })
}

pub async fn create_token_price_endpoint(
    State(state): State<MutationState>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let price = TokenPrice::parse(&form)?;

    Ok(mutation::create(&price, &TOKEN_PRICES, &state))
}

pub async fn update_token_price_endpoint(
    State(state): State<MutationState>,
    Path(token_price_id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<MutationOutcome, Error> {
    let price = TokenPrice::parse(&form)?;

    Ok(mutation::update(
        &token_price_id,
        &price,
        &TOKEN_PRICES,
        &state,
    ))
}

pub async fn delete_token_price_endpoint(
    State(state): State<MutationState>,
    Path(token_price_id): Path<String>,
) -> MutationOutcome {
    mutation::delete(&token_price_id, TokenPrice::TABLE, &TOKEN_PRICES, &state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        dashboard::DashboardState,
        db::initialize,
        endpoints,
        form::FormData,
        mutation::{MutationOutcome, MutationState},
        view_cache::ViewCache,
    };

    use super::{
        TokenPrice, create_token_price_endpoint, delete_token_price_endpoint, get_funds_page,
        get_token_prices, update_token_price_endpoint,
    };

    fn get_state() -> MutationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        MutationState {
            db_connection: Arc::new(Mutex::new(connection)),
            view_cache: ViewCache::new(),
        }
    }

    fn form(price: &str) -> Form<FormData> {
        Form(FormData::from([
            ("date", "2024-05-01"),
            ("tokenname", "FUND"),
            ("price", price),
        ]))
    }

    async fn count_rendered_prices(state: &MutationState) -> usize {
        let dashboard = DashboardState {
            db_connection: state.db_connection.clone(),
            view_cache: state.view_cache.clone(),
        };
        let page = get_funds_page(State(dashboard)).await.unwrap();

        Html::parse_document(&page.0)
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .count()
    }

    #[tokio::test]
    async fn create_revalidates_funds_page() {
        let state = get_state();
        assert_eq!(count_rendered_prices(&state).await, 0);

        let outcome = create_token_price_endpoint(State(state.clone()), form("1.25"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            MutationOutcome::Redirect {
                path: endpoints::FUNDS_VIEW
            }
        );
        assert_eq!(count_rendered_prices(&state).await, 1);
    }

    #[tokio::test]
    async fn update_then_delete() {
        let state = get_state();
        create_token_price_endpoint(State(state.clone()), form("1.25"))
            .await
            .unwrap();
        let id = get_token_prices(&state.db_connection.lock().unwrap()).unwrap()[0]
            .id
            .clone();

        update_token_price_endpoint(State(state.clone()), Path(id.clone()), form("2"))
            .await
            .unwrap();
        assert_eq!(
            get_token_prices(&state.db_connection.lock().unwrap()).unwrap()[0].record,
            TokenPrice {
                date: "2024-05-01".to_owned(),
                token_name: "FUND".to_owned(),
                price: 2.0,
            }
        );

        let outcome = delete_token_price_endpoint(State(state.clone()), Path(id)).await;

        assert_eq!(
            outcome,
            MutationOutcome::Revalidated {
                entity: "Token Price"
            }
        );
        assert_eq!(count_rendered_prices(&state).await, 0);
    }
}
