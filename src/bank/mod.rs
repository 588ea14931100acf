//! Linking a bank account through an open-banking aggregator and importing
//! its transactions.

mod client;
mod endpoints;
mod import;

pub use client::BankClient;
pub use endpoints::{
    create_link_token_endpoint, exchange_public_token_endpoint, import_bank_transactions_endpoint,
    unlink_bank_endpoint,
};

#[cfg(test)]
pub use endpoints::BankState;
