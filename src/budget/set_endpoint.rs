//! Defines the endpoint for setting the budget of a month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, amount::parse_amount, auth::UserID, budget::core::set_budget, endpoints,
    month::parse_month,
};

/// The state needed to set or delete a budget.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for setting a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    /// The month in the format `YYYY-MM`.
    pub month: String,
    /// The budget in dollars, e.g. "500.00".
    pub amount: String,
}

/// A route handler for setting the budget of a month, replacing any existing
/// budget for that month. Redirects to the budgets page on success.
pub async fn set_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let (month, amount) = match parse_month(&form.month)
        .and_then(|month| parse_amount(&form.amount).map(|amount| (month, amount)))
    {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = set_budget(user_id, month, amount, &connection) {
        tracing::error!("could not set budget: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
