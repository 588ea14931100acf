//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token in the cookie jar has expired.
    #[error("the auth token has expired")]
    TokenExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is already taken by another user.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// A bank transaction with the same bank transaction ID was already imported.
    #[error("the bank transaction has already been imported")]
    DuplicateBankTransaction,

    /// The amount is not a positive number with at most two decimal places,
    /// or it is too large to store.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An expense was submitted without a category.
    #[error("expenses must have a category")]
    MissingCategory,

    /// The transaction description is longer than allowed.
    #[error("the description must be at most {0} characters")]
    DescriptionTooLong(usize),

    /// A month string could not be parsed as `YYYY-MM`.
    #[error("invalid month \"{0}\"")]
    InvalidMonth(String),

    /// A date string could not be parsed as `YYYY-MM-DD`.
    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    /// Tried to add savings before a savings goal was set.
    #[error("no savings goal has been set")]
    GoalNotSet,

    /// A message to the assistant was empty or only whitespace.
    #[error("the chat message is empty")]
    EmptyChatMessage,

    /// A message to the assistant is longer than allowed.
    #[error("the chat message must be at most {0} characters")]
    ChatMessageTooLong(usize),

    /// No API key has been configured for the assistant's LLM provider.
    #[error("no API key configured for the service {0}")]
    MissingApiKey(String),

    /// The LLM provider returned an error or could not be reached.
    #[error("the LLM request failed: {0}")]
    LlmRequest(String),

    /// No bank aggregation credentials have been configured.
    #[error("the bank integration has not been configured")]
    BankNotConfigured,

    /// The user has not linked a bank account yet.
    #[error("no bank account is linked")]
    BankNotLinked,

    /// The bank aggregation provider returned an error or could not be reached.
    #[error("the bank request failed: {0}")]
    BankRequest(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067
                    && desc.ends_with("transaction.bank_transaction_id") =>
            {
                Error::DuplicateBankTransaction
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidAmount(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details,
                },
            ),
            Error::MissingCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Category is required".to_owned(),
                    details: "Choose a category for the expense.".to_owned(),
                },
            ),
            Error::DescriptionTooLong(max_length) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Description is too long".to_owned(),
                    details: format!("Descriptions can be at most {max_length} characters long."),
                },
            ),
            Error::InvalidMonth(_) => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Invalid month format.".to_owned(),
                },
            ),
            Error::InvalidDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid date".to_owned(),
                    details: format!("\"{date}\" is not a date in the format YYYY-MM-DD."),
                },
            ),
            Error::GoalNotSet => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "No savings goal".to_owned(),
                    details: "Set a savings target before adding to your savings.".to_owned(),
                },
            ),
            Error::EmptyChatMessage => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Type a message for the assistant first.".to_owned(),
                },
            ),
            Error::ChatMessageTooLong(max_length) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Message is too long".to_owned(),
                    details: format!("Messages can be at most {max_length} characters long."),
                },
            ),
            Error::MissingApiKey(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "The assistant is not available".to_owned(),
                    details: format!(
                        "No API key has been configured for {service}. \
                        Ask the administrator to set one with the 'configure' program."
                    ),
                },
            ),
            Error::LlmRequest(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "The assistant could not respond".to_owned(),
                    details: "The AI service returned an error. Try again later.".to_owned(),
                },
            ),
            Error::BankNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "Bank linking is not available".to_owned(),
                    details: "Ask the administrator to configure the bank integration with the \
                    'configure' program."
                        .to_owned(),
                },
            ),
            Error::BankNotLinked => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "No bank account linked".to_owned(),
                    details: "Link a bank account from the account settings page first."
                        .to_owned(),
                },
            ),
            Error::BankRequest(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "The bank request failed".to_owned(),
                    details: "The bank service returned an error. Try again later.".to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "The requested resource could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete budget".to_owned(),
                    details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
