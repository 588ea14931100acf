use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{Html, IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::UserID, database_id::TransactionId,
    transaction::core::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the user's transactions.
///
/// Responds with an empty body on success so HTMX removes the table row,
/// otherwise responds with an alert.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(user_id, transaction_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{create_test_user, create_test_user_with_username, get_test_connection},
        transaction::{
            NewTransaction, TransactionType, create_transaction, delete_transaction_endpoint,
            delete_endpoint::DeleteTransactionState, get_transaction,
        },
    };

    #[tokio::test]
    async fn deletes_own_transaction() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let transaction = NewTransaction::new(
            5.0,
            TransactionType::Cash,
            None,
            "ATM",
            date!(2025 - 01 - 01),
        )
        .unwrap();
        let transaction = create_transaction(user.id, transaction, &connection).unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(transaction.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(user.id, transaction.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn cannot_delete_other_users_transaction() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection);
        let other = create_test_user_with_username("other", &connection);
        let transaction = NewTransaction::new(
            5.0,
            TransactionType::Cash,
            None,
            "ATM",
            date!(2025 - 01 - 01),
        )
        .unwrap();
        let transaction = create_transaction(owner.id, transaction, &connection).unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(other.id),
            Path(transaction.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(owner.id, transaction.id, &connection).is_ok());
    }

    #[tokio::test]
    async fn missing_transaction_responds_not_found() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_transaction_endpoint(State(state), Extension(user.id), Path(42)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
