//! FinDice is a web app for tracking income and expenses, setting budgets and
//! savings goals, and getting advice from an AI financial assistant.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod admin_config;
mod alert;
mod amount;
mod app_state;
mod assistant;
mod auth;
mod bank;
mod budget;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod error;
mod goal;
mod html;
mod internal_server_error;
mod learn_page;
mod logging;
mod month;
mod navigation;
mod not_found;
mod pagination;
mod profile;
mod reports;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use admin_config::{
    ApiConfig, BankConfig, BankEnvironment, DEFAULT_SERVICE_NAME, SystemPrompt, add_system_prompt,
    get_active_system_prompt, get_api_configs, get_bank_config, get_system_prompts, mask_secret,
    set_api_key, set_bank_config,
};
pub use app_state::{AppState, create_cookie_key};
pub use assistant::{ChatClient, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};
pub use auth::{
    NewUser, PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_id,
    get_user_by_username, update_password,
};
pub use budget::set_budget;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use goal::{add_savings, set_goal_target};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use profile::create_profile;
pub use routing::build_router;
pub use transaction::{Category, NewTransaction, TransactionType, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
