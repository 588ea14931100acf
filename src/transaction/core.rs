//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::MAX_AMOUNT,
    auth::UserID,
    database_id::TransactionId,
};

/// The maximum number of characters in a transaction description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned, spent, or taken out as cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned on top of the base income.
    Income,
    /// Money spent. Expenses always have a category.
    Expense,
    /// Cash withdrawn.
    Cash,
}

impl TransactionType {
    /// Every transaction type, in the order they are shown in forms.
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Cash,
    ];

    /// The value stored in the database and used in forms and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Cash => "cash",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
            TransactionType::Cash => "Cash",
        }
    }

    fn from_db_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::from_db_str(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown transaction type {text}").into()))
    }
}

/// The fixed set of spending categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Groceries, restaurants and coffee.
    Food,
    /// Rent and housing.
    Rent,
    /// Entertainment and recreation.
    Entertainment,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category, in the order they are shown in forms and charts.
    pub const ALL: [Category; 4] = [
        Category::Food,
        Category::Rent,
        Category::Entertainment,
        Category::Other,
    ];

    /// The value stored in the database and used in forms and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Rent => "rent",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }

    /// The human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Rent => "Rent",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        }
    }

    fn from_db_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == value)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Category::from_db_str(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown category {text}").into()))
    }
}

/// Income, an expense or a cash withdrawal logged by a user.
///
/// To create a new `Transaction`, use [NewTransaction::new].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to.
    pub user_id: UserID,
    /// The amount of money in dollars, always positive.
    pub amount: f64,
    pub transaction_type: TransactionType,
    /// The spending category, only set for expenses.
    pub category: Option<Category>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The bank aggregator's ID for imported transactions.
    pub bank_transaction_id: Option<String>,
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: Option<Category>,
    pub description: String,
    pub date: Date,
    pub bank_transaction_id: Option<String>,
}

impl NewTransaction {
    /// Validate the fields of a new transaction.
    ///
    /// The category is dropped for income and cash transactions.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidAmount] if `amount` is not positive or is larger than [MAX_AMOUNT],
    /// - [Error::MissingCategory] if an expense has no category,
    /// - [Error::DescriptionTooLong] if `description` is longer than [MAX_DESCRIPTION_LENGTH].
    pub fn new(
        amount: f64,
        transaction_type: TransactionType,
        category: Option<Category>,
        description: &str,
        date: Date,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount(
                "The amount must be greater than zero.".to_owned(),
            ));
        }

        if amount > MAX_AMOUNT {
            return Err(Error::InvalidAmount(format!(
                "Amounts must be at most {MAX_AMOUNT:.2}."
            )));
        }

        let category = match (transaction_type, category) {
            (TransactionType::Expense, None) => return Err(Error::MissingCategory),
            (TransactionType::Expense, category) => category,
            (_, _) => None,
        };

        let description = description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::DescriptionTooLong(MAX_DESCRIPTION_LENGTH));
        }

        Ok(Self {
            amount,
            transaction_type,
            category,
            description: description.to_owned(),
            date,
            bank_transaction_id: None,
        })
    }

    /// Mark the transaction as imported from the bank with the bank's ID.
    pub fn bank_transaction_id(mut self, bank_transaction_id: &str) -> Self {
        self.bank_transaction_id = Some(bank_transaction_id.to_owned());
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, type, category, description, date, bank_transaction_id";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense', 'cash')),
                category TEXT CHECK (category IN ('food', 'rent', 'entertainment', 'other')),
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                bank_transaction_id TEXT UNIQUE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Store a new transaction for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBankTransaction] if the bank transaction was already stored,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, amount, type, category, description, date, bank_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                transaction.amount,
                transaction.transaction_type,
                transaction.category,
                transaction.description,
                transaction.date,
                transaction.bank_transaction_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Store an imported transaction unless one with the same bank transaction ID exists.
///
/// Returns whether the transaction was inserted.
pub fn create_transaction_if_new(
    user_id: UserID,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO \"transaction\"
            (user_id, amount, type, category, description, date, bank_transaction_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(bank_transaction_id) DO NOTHING",
        (
            user_id.as_i64(),
            transaction.amount,
            transaction.transaction_type,
            transaction.category,
            &transaction.description,
            transaction.date,
            &transaction.bank_transaction_id,
        ),
    )?;

    Ok(rows_affected == 1)
}

/// Retrieve the transaction `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the user has no such transaction.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Map a database row selected with the transaction columns to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        transaction_type: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        bank_transaction_id: row.get(7)?,
    })
}

/// The column list used by [map_transaction_row].
pub(crate) fn transaction_columns() -> &'static str {
    TRANSACTION_COLUMNS
}
