//! Converts bank transactions into FinDice transactions and stores them.

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    bank::client::BankTransaction,
    month::parse_date,
    transaction::{
        Category, MAX_DESCRIPTION_LENGTH, NewTransaction, TransactionType,
        create_transaction_if_new,
    },
};

/// How many bank transactions were stored and how many were left out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Already imported or invalid transactions.
    pub skipped: usize,
}

fn category_from_word(word: &str) -> Option<Category> {
    match word {
        "food" | "restaurants" | "restaurant" | "groceries" | "coffee" => Some(Category::Food),
        "rent" => Some(Category::Rent),
        "entertainment" | "recreation" => Some(Category::Entertainment),
        _ => None,
    }
}

/// Map the provider's category labels onto the fixed expense categories.
///
/// The personal finance category is checked before the legacy hierarchy.
/// Anything that is not food, rent or entertainment is [Category::Other].
pub fn normalise_category(transaction: &BankTransaction) -> Category {
    let personal_finance = transaction
        .personal_finance_category
        .iter()
        .map(|category| category.primary.as_str());
    let legacy = transaction
        .category
        .iter()
        .flatten()
        .map(String::as_str);

    personal_finance
        .chain(legacy)
        .flat_map(|label| {
            label
                .split(|c: char| !c.is_alphanumeric())
                .filter(|word| !word.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .find_map(|word| category_from_word(&word))
        .unwrap_or(Category::Other)
}

/// Convert a bank transaction into a new transaction.
///
/// Money leaving the account (a positive amount) is an expense and money
/// coming in (a negative amount) is income with the absolute amount.
///
/// # Errors
/// Returns an error if the date cannot be parsed or the amount is zero or
/// too large.
pub fn to_new_transaction(transaction: &BankTransaction) -> Result<NewTransaction, Error> {
    let date = parse_date(&transaction.date)?;

    let (transaction_type, category) = if transaction.amount > 0.0 {
        (
            TransactionType::Expense,
            Some(normalise_category(transaction)),
        )
    } else {
        (TransactionType::Income, None)
    };

    let description: String = transaction
        .merchant_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&transaction.name)
        .chars()
        .take(MAX_DESCRIPTION_LENGTH)
        .collect();

    NewTransaction::new(
        transaction.amount.abs(),
        transaction_type,
        category,
        &description,
        date,
    )
    .map(|new_transaction| new_transaction.bank_transaction_id(&transaction.transaction_id))
}

/// Store the bank transactions for `user_id`, skipping those already imported.
///
/// All transactions are stored in a single SQL transaction.
pub fn import_bank_transactions(
    user_id: UserID,
    transactions: &[BankTransaction],
    connection: &Connection,
) -> Result<ImportSummary, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    for transaction in transactions {
        let new_transaction = match to_new_transaction(transaction) {
            Ok(new_transaction) => new_transaction,
            Err(error) => {
                tracing::warn!(
                    "skipping bank transaction {}: {error}",
                    transaction.transaction_id
                );
                summary.skipped += 1;
                continue;
            }
        };

        if create_transaction_if_new(user_id, &new_transaction, &sql_transaction)? {
            summary.imported += 1;
        } else {
            summary.skipped += 1;
        }
    }

    sql_transaction.commit()?;

    Ok(summary)
}
