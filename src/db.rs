//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    admin_config::{create_api_config_table, create_bank_config_table, create_system_prompt_table},
    assistant::create_chat_message_table,
    auth::create_user_table,
    budget::create_budget_table,
    goal::create_goal_table,
    profile::create_profile_table,
    transaction::create_transaction_table,
};

/// Create all the application tables if they do not already exist.
///
/// The tables are created in a single transaction, so either every table is
/// created or none are.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_chat_message_table(&transaction)?;
    create_api_config_table(&transaction)?;
    create_system_prompt_table(&transaction)?;
    create_bank_config_table(&transaction)?;

    transaction.commit()
}
