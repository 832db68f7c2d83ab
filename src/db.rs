//! Creates the application's tables.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, customer::create_customer_table,
    invoice::create_invoice_table, movement::create_movement_table,
    token_price::create_token_price_table, transaction::create_transaction_table,
};

/// Create every table that does not exist yet, in a single transaction.
///
/// Rows are not linked by foreign keys: deleting a customer leaves their
/// transactions, invoices and movements in place.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_customer_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_invoice_table(&transaction)?;
    create_movement_table(&transaction)?;
    create_token_price_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
