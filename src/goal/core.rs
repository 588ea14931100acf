//! The savings goal: one target amount per user and the savings towards it.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{Error, auth::UserID};

/// A user's savings target and how much they have saved so far.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialGoal {
    pub user_id: UserID,
    /// The amount the user wants to save, in dollars.
    pub target_amount: f64,
    /// The amount saved so far, in dollars.
    pub current_savings: f64,
    pub created_at: OffsetDateTime,
}

impl FinancialGoal {
    /// The savings as a percentage of the target, 0 when the target is 0.
    ///
    /// This is the raw value and may exceed 100, see [FinancialGoal::display_percentage].
    pub fn progress_percentage(&self) -> f64 {
        if self.target_amount == 0.0 {
            0.0
        } else {
            self.current_savings / self.target_amount * 100.0
        }
    }

    /// The progress percentage capped at 100 for progress bars and labels.
    pub fn display_percentage(&self) -> f64 {
        self.progress_percentage().min(100.0)
    }

    /// How much is left to save, never negative.
    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_savings).max(0.0)
    }

    /// Whether the savings have reached the target.
    pub fn is_complete(&self) -> bool {
        self.target_amount > 0.0 && self.current_savings >= self.target_amount
    }
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS financial_goal (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                target_amount REAL NOT NULL,
                current_savings REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Set the savings target of `user_id`.
///
/// An existing goal keeps its savings and only has its target replaced.
pub fn set_goal_target(
    user_id: UserID,
    target_amount: f64,
    connection: &Connection,
) -> Result<FinancialGoal, Error> {
    connection
        .prepare(
            "INSERT INTO financial_goal (user_id, target_amount, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET target_amount = excluded.target_amount
             RETURNING user_id, target_amount, current_savings, created_at",
        )?
        .query_row(
            (user_id.as_i64(), target_amount, OffsetDateTime::now_utc()),
            map_goal_row,
        )
        .map_err(|error| error.into())
}

/// Get the goal of `user_id`, if one has been set.
pub fn get_goal(user_id: UserID, connection: &Connection) -> Result<Option<FinancialGoal>, Error> {
    connection
        .prepare(
            "SELECT user_id, target_amount, current_savings, created_at
             FROM financial_goal WHERE user_id = ?1",
        )?
        .query_row([user_id.as_i64()], map_goal_row)
        .optional()
        .map_err(|error| error.into())
}

/// Add `amount` to the savings of `user_id`.
///
/// # Errors
/// Returns [Error::GoalNotSet] if the user has not set a goal.
pub fn add_savings(
    user_id: UserID,
    amount: f64,
    connection: &Connection,
) -> Result<FinancialGoal, Error> {
    connection
        .prepare(
            "UPDATE financial_goal SET current_savings = current_savings + ?1
             WHERE user_id = ?2
             RETURNING user_id, target_amount, current_savings, created_at",
        )?
        .query_row((amount, user_id.as_i64()), map_goal_row)
        .optional()?
        .ok_or(Error::GoalNotSet)
}

/// Delete the goal of `user_id`, if any.
pub fn reset_goal(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM financial_goal WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<FinancialGoal, rusqlite::Error> {
    Ok(FinancialGoal {
        user_id: UserID::new(row.get(0)?),
        target_amount: row.get(1)?,
        current_savings: row.get(2)?,
        created_at: row.get(3)?,
    })
}


#[cfg(test)]
mod database_tests {
    use crate::{
        Error,
        goal::{add_savings, get_goal, reset_goal, set_goal_target},
        test_utils::{create_test_user, get_test_connection},
    };

    #[test]
    fn changing_target_keeps_savings() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        set_goal_target(user.id, 1000.0, &connection).unwrap();
        add_savings(user.id, 200.0, &connection).unwrap();

        let goal = set_goal_target(user.id, 5000.0, &connection).unwrap();

        assert_eq!(goal.target_amount, 5000.0);
        assert_eq!(goal.current_savings, 200.0);
    }

    #[test]
    fn add_savings_accumulates() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        set_goal_target(user.id, 1000.0, &connection).unwrap();

        add_savings(user.id, 100.0, &connection).unwrap();
        let goal = add_savings(user.id, 50.5, &connection).unwrap();

        assert_eq!(goal.current_savings, 150.5);
    }

    #[test]
    fn add_savings_without_goal_fails() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        assert_eq!(
            add_savings(user.id, 100.0, &connection),
            Err(Error::GoalNotSet)
        );
    }

    #[test]
    fn reset_goal_deletes_it() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        set_goal_target(user.id, 1000.0, &connection).unwrap();

        reset_goal(user.id, &connection).unwrap();

        assert_eq!(get_goal(user.id, &connection), Ok(None));
    }
}
