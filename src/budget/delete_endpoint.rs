use axum::{
    Extension,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::{
    Error,
    auth::UserID,
    budget::{core::delete_budget, set_endpoint::BudgetState},
    database_id::BudgetId,
};

/// A route handler for deleting one of the user's budgets.
///
/// Responds with an empty body on success so HTMX removes the table row,
/// otherwise responds with an alert.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(user_id, budget_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
