use rusqlite::Connection;

use crate::{
    auth::{NewUser, PasswordHash, User, ValidatedPassword, create_user},
    db::initialize,
};

/// A password that passes the strength check.
pub(crate) const TEST_PASSWORD: &str = "iamtestingwhethericancreateanewuser";

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open database in memory");
    initialize(&connection).expect("could not initialize test DB");

    connection
}

/// Create the user "testuser" with [TEST_PASSWORD] and no profile.
pub(crate) fn create_test_user(connection: &Connection) -> User {
    create_test_user_with_username("testuser", connection)
}

pub(crate) fn create_test_user_with_username(username: &str, connection: &Connection) -> User {
    let password = ValidatedPassword::new_unchecked(TEST_PASSWORD);
    let password_hash = PasswordHash::new(password, 4).expect("could not hash password");

    create_user(
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        connection,
    )
    .expect("could not create test user")
}
