//! The user profile: base income and the bank link, one row per user.

use rusqlite::{Connection, OptionalExtension, Row};
use time::Date;

use crate::{Error, auth::UserID};

/// The per-user settings that do not belong on the user row itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: UserID,
    /// The user's regular income in dollars, on top of logged income transactions.
    pub income: f64,
    /// The bank aggregation provider's access token, `None` if no bank is linked.
    pub bank_access_token: Option<String>,
    /// The local date of the last successful bank import.
    pub bank_last_import: Option<Date>,
}

impl Profile {
    /// Whether the user has linked a bank account.
    pub fn is_bank_linked(&self) -> bool {
        self.bank_access_token.is_some()
    }
}

pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_profile (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                income REAL NOT NULL DEFAULT 0,
                bank_access_token TEXT,
                bank_last_import TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create the profile for a newly registered user.
///
/// # Errors
/// Returns [Error::SqlError] if the user already has a profile or does not exist.
pub fn create_profile(
    user_id: UserID,
    income: f64,
    connection: &Connection,
) -> Result<Profile, Error> {
    connection.execute(
        "INSERT INTO user_profile (user_id, income) VALUES (?1, ?2)",
        (user_id.as_i64(), income),
    )?;

    Ok(Profile {
        user_id,
        income,
        bank_access_token: None,
        bank_last_import: None,
    })
}

/// Get the profile of `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no profile.
pub fn get_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection
        .prepare(
            "SELECT user_id, income, bank_access_token, bank_last_import
             FROM user_profile WHERE user_id = ?1",
        )?
        .query_row([user_id.as_i64()], map_profile_row)
        .map_err(|error| error.into())
}

/// Get the profile of `user_id`, or a profile with no income and no bank link
/// for users created before profiles were stored.
pub fn get_profile_or_default(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    let profile = connection
        .prepare(
            "SELECT user_id, income, bank_access_token, bank_last_import
             FROM user_profile WHERE user_id = ?1",
        )?
        .query_row([user_id.as_i64()], map_profile_row)
        .optional()?;

    Ok(profile.unwrap_or(Profile {
        user_id,
        income: 0.0,
        bank_access_token: None,
        bank_last_import: None,
    }))
}

/// Set the base income of `user_id`, creating the profile if needed.
pub fn update_income(user_id: UserID, income: f64, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_profile (user_id, income) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET income = excluded.income",
        (user_id.as_i64(), income),
    )?;

    Ok(())
}

/// Store or clear the bank access token of `user_id`.
///
/// Clearing the token also forgets the last import date.
pub fn set_bank_access_token(
    user_id: UserID,
    access_token: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_profile (user_id, bank_access_token) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET
            bank_access_token = excluded.bank_access_token,
            bank_last_import = NULL",
        (user_id.as_i64(), access_token),
    )?;

    Ok(())
}

/// Record that the bank transactions of `user_id` were imported on `date`.
pub fn set_bank_last_import(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user_profile SET bank_last_import = ?1 WHERE user_id = ?2",
        (date, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        user_id: UserID::new(row.get(0)?),
        income: row.get(1)?,
        bank_access_token: row.get(2)?,
        bank_last_import: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        profile::core::{
            create_profile, get_profile, get_profile_or_default, set_bank_access_token,
            set_bank_last_import, update_income,
        },
        test_utils::{create_test_user, get_test_connection},
    };

    #[test]
    fn create_and_get_profile() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        let created = create_profile(user.id, 1234.5, &connection).unwrap();

        assert_eq!(get_profile(user.id, &connection), Ok(created));
    }

    #[test]
    fn get_missing_profile() {
        let connection = get_test_connection();

        assert_eq!(
            get_profile(UserID::new(99), &connection),
            Err(Error::NotFound)
        );
        let profile = get_profile_or_default(UserID::new(99), &connection).unwrap();
        assert_eq!(profile.income, 0.0);
        assert!(!profile.is_bank_linked());
    }

    #[test]
    fn update_income_creates_or_replaces() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        update_income(user.id, 100.0, &connection).unwrap();
        update_income(user.id, 250.25, &connection).unwrap();

        assert_eq!(get_profile(user.id, &connection).unwrap().income, 250.25);
    }

    #[test]
    fn link_and_unlink_bank() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        create_profile(user.id, 0.0, &connection).unwrap();

        set_bank_access_token(user.id, Some("access-sandbox-123"), &connection).unwrap();
        set_bank_last_import(user.id, date!(2025 - 03 - 04), &connection).unwrap();

        let profile = get_profile(user.id, &connection).unwrap();
        assert!(profile.is_bank_linked());
        assert_eq!(profile.bank_last_import, Some(date!(2025 - 03 - 04)));

        set_bank_access_token(user.id, None, &connection).unwrap();

        let profile = get_profile(user.id, &connection).unwrap();
        assert!(!profile.is_bank_linked());
        assert_eq!(profile.bank_last_import, None);
    }
}
