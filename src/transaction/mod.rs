//! Income, expense and cash transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `NewTransaction` for validating new transactions
//! - Database functions for storing, filtering and totalling transactions
//! - View handlers for the transaction pages and the CSV export

mod core;
mod create_endpoint;
mod delete_endpoint;
mod export;
mod new_transaction_page;
mod query;
mod transactions_page;

pub use core::{
    Category, MAX_DESCRIPTION_LENGTH, NewTransaction, Transaction, TransactionType,
    create_transaction, create_transaction_if_new, create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use export::export_transactions;
pub use new_transaction_page::get_new_transaction_page;
pub use query::{get_expenses_by_category, get_recent_transactions, get_totals};
pub use transactions_page::get_transactions_page;

#[cfg(test)]
pub use core::{delete_transaction, get_transaction};
#[cfg(test)]
pub use query::{TransactionFilter, query_transactions};
