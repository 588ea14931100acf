//! Endpoints for setting the savings target, adding savings and resetting the goal.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error,
    amount::parse_positive_amount,
    auth::UserID,
    endpoints,
    goal::{
        core::{add_savings, reset_goal, set_goal_target},
        goal_page::GoalState,
    },
};

/// The form data for the goal target and savings forms.
#[derive(Debug, Deserialize)]
pub struct GoalAmountForm {
    /// An amount in dollars greater than zero, e.g. "100.00".
    pub amount: String,
}

fn redirect_to_goal_page() -> Response {
    (
        HxRedirect(endpoints::GOAL_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for setting the savings target. Existing savings are kept.
pub async fn set_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<GoalAmountForm>,
) -> Response {
    let target_amount = match parse_positive_amount(&form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_goal_target(user_id, target_amount, &connection) {
        Ok(_) => redirect_to_goal_page(),
        Err(error) => {
            tracing::error!("could not set goal target: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for adding to the savings of the goal.
pub async fn add_savings_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<GoalAmountForm>,
) -> Response {
    let amount = match parse_positive_amount(&form.amount) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match add_savings(user_id, amount, &connection) {
        Ok(_) => redirect_to_goal_page(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting the goal and its savings.
pub async fn reset_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match reset_goal(user_id, &connection) {
        Ok(()) => redirect_to_goal_page(),
        Err(error) => {
            tracing::error!("could not reset goal: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;

    use crate::{
        auth::UserID,
        endpoints,
        goal::{
            add_savings_endpoint, endpoints::GoalAmountForm, get_goal, goal_page::GoalState,
            reset_goal_endpoint, set_goal_endpoint,
        },
        test_utils::{assert_hx_redirect, create_test_user, get_test_connection},
    };

    fn get_state() -> (GoalState, UserID) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        (
            GoalState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn form(amount: &str) -> Form<GoalAmountForm> {
        Form(GoalAmountForm {
            amount: amount.to_owned(),
        })
    }

    #[tokio::test]
    async fn set_target_then_add_savings() {
        let (state, user_id) = get_state();

        let response =
            set_goal_endpoint(State(state.clone()), Extension(user_id), form("1000")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::GOAL_VIEW);

        let response =
            add_savings_endpoint(State(state.clone()), Extension(user_id), form("250.25")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let goal = get_goal(user_id, &connection).unwrap().unwrap();
        assert_eq!(goal.target_amount, 1000.0);
        assert_eq!(goal.current_savings, 250.25);
    }

    #[tokio::test]
    async fn target_must_be_positive() {
        let (state, user_id) = get_state();

        let response = set_goal_endpoint(State(state), Extension(user_id), form("0")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn adding_savings_without_goal_shows_alert() {
        let (state, user_id) = get_state();

        let response = add_savings_endpoint(State(state), Extension(user_id), form("10")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_deletes_goal() {
        let (state, user_id) = get_state();
        set_goal_endpoint(State(state.clone()), Extension(user_id), form("1000")).await;

        let response = reset_goal_endpoint(State(state.clone()), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_goal(user_id, &connection), Ok(None));
    }
}
