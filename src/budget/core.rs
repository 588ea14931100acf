//! Monthly budgets and the spending measured against them.

use rusqlite::{Connection, OptionalExtension, Row};
use time::Date;

use crate::{Error, auth::UserID, database_id::BudgetId, month::first_of_month};

/// A spending ceiling for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    /// The first day of the month the budget applies to.
    pub month: Date,
    /// The most the user wants to spend in the month, in dollars.
    pub amount: f64,
}

/// A budget with the month's expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget: Budget,
    /// The sum of the expenses in the budget's month.
    pub spent: f64,
}

impl BudgetStatus {
    /// The budget amount minus the amount spent, negative when over budget.
    pub fn remaining(&self) -> f64 {
        self.budget.amount - self.spent
    }

    /// The percentage of the budget that has been spent, 0 when the budget is 0.
    ///
    /// May exceed 100.
    pub fn percentage_used(&self) -> f64 {
        if self.budget.amount == 0.0 {
            0.0
        } else {
            self.spent / self.budget.amount * 100.0
        }
    }

    /// Whether more than the budget amount has been spent.
    pub fn is_over_budget(&self) -> bool {
        self.spent > self.budget.amount
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                month TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                UNIQUE(user_id, month),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Set the budget of `user_id` for the month containing `month`.
///
/// If the user already has a budget for that month, its amount is replaced.
pub fn set_budget(
    user_id: UserID,
    month: Date,
    amount: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(
            "INSERT INTO budget (user_id, month, amount) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, month) DO UPDATE SET amount = excluded.amount
             RETURNING id, user_id, month, amount",
        )?
        .query_row(
            (user_id.as_i64(), first_of_month(month), amount),
            map_budget_row,
        )
        .map_err(|error| error.into())
}

// The expenses are summed from the first day of the budget month up to, but
// not including, the first day of the next month.
const BUDGET_STATUS_QUERY: &str = "SELECT budget.id, budget.user_id, budget.month, budget.amount,
        (SELECT COALESCE(SUM(t.amount), 0) FROM \"transaction\" t
         WHERE t.user_id = budget.user_id
            AND t.type = 'expense'
            AND t.date >= budget.month
            AND t.date < date(budget.month, '+1 month')) AS spent
    FROM budget";

/// Get every budget of `user_id` with its spending, newest month first.
pub fn get_budget_statuses(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetStatus>, Error> {
    connection
        .prepare(&format!(
            "{BUDGET_STATUS_QUERY} WHERE budget.user_id = ?1 ORDER BY budget.month DESC"
        ))?
        .query_map([user_id.as_i64()], map_budget_status_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Get the budget of `user_id` for the month containing `month`, if one is set.
pub fn get_budget_status_for_month(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Option<BudgetStatus>, Error> {
    connection
        .prepare(&format!(
            "{BUDGET_STATUS_QUERY} WHERE budget.user_id = ?1 AND budget.month = ?2"
        ))?
        .query_row(
            (user_id.as_i64(), first_of_month(month)),
            map_budget_status_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Delete the budget `id` of `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if the user has no such budget.
pub fn delete_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        month: row.get(2)?,
        amount: row.get(3)?,
    })
}

fn map_budget_status_row(row: &Row) -> Result<BudgetStatus, rusqlite::Error> {
    Ok(BudgetStatus {
        budget: map_budget_row(row)?,
        spent: row.get(4)?,
    })
}
