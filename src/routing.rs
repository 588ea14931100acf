//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    assistant::{clear_chat_endpoint, get_assistant_page, send_chat_message_endpoint},
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    bank::{
        create_link_token_endpoint, exchange_public_token_endpoint,
        import_bank_transactions_endpoint, unlink_bank_endpoint,
    },
    budget::{delete_budget_endpoint, get_budgets_page, set_budget_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    goal::{add_savings_endpoint, get_goal_page, reset_goal_endpoint, set_goal_endpoint},
    internal_server_error::get_internal_server_error_page,
    learn_page::get_learn_page,
    not_found::get_404_not_found,
    profile::{get_account_page, update_profile_endpoint},
    reports::get_reports_page,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions,
        get_new_transaction_page, get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LEARN_VIEW, get(get_learn_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_new_transaction_page))
        .route(endpoints::EXPORT_TRANSACTIONS, get(export_transactions))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::GOAL_VIEW, get(get_goal_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::ASSISTANT_VIEW, get(get_assistant_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PROFILE_API, post(update_profile_endpoint))
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
            .route(endpoints::BUDGETS_API, post(set_budget_endpoint))
            .route(endpoints::BUDGET, delete(delete_budget_endpoint))
            .route(
                endpoints::GOAL_API,
                post(set_goal_endpoint).delete(reset_goal_endpoint),
            )
            .route(endpoints::GOAL_SAVINGS_API, post(add_savings_endpoint))
            .route(
                endpoints::CHAT_API,
                post(send_chat_message_endpoint).delete(clear_chat_endpoint),
            )
            .route(endpoints::BANK_LINK_TOKEN, post(create_link_token_endpoint))
            .route(endpoints::BANK_EXCHANGE, post(exchange_public_token_endpoint))
            .route(
                endpoints::BANK_IMPORT,
                post(import_bank_transactions_endpoint),
            )
            .route(endpoints::BANK_UNLINK, post(unlink_bank_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
