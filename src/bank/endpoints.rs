//! Endpoints for linking a bank account, importing its transactions and unlinking it.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    admin_config::{BankConfig, get_bank_config},
    alert::Alert,
    auth::UserID,
    bank::{client::BankClient, import::import_bank_transactions},
    endpoints,
    profile::{get_profile_or_default, set_bank_access_token, set_bank_last_import},
    timezone::get_local_date,
};

/// How far back an import looks for transactions.
pub const IMPORT_WINDOW_DAYS: i64 = 30;

/// The state needed for the bank endpoints.
#[derive(Debug, Clone)]
pub struct BankState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub bank_client: BankClient,
}

impl FromRef<AppState> for BankState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            bank_client: state.bank_client.clone(),
        }
    }
}

/// The link token for the client-side Link widget.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

/// The form data posted by the Link widget's success callback.
#[derive(Debug, Deserialize)]
pub struct ExchangeForm {
    pub public_token: String,
}

fn redirect_to_account_page() -> Response {
    (
        HxRedirect(endpoints::ACCOUNT_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn load_bank_config(state: &BankState) -> Result<BankConfig, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_bank_config(&connection)?.ok_or(Error::BankNotConfigured)
}

/// A route handler that creates a link token for the user.
///
/// Responds with `{"link_token": "..."}` on success and an alert otherwise.
pub async fn create_link_token_endpoint(
    State(state): State<BankState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let config = match load_bank_config(&state) {
        Ok(config) => config,
        Err(error) => return error.into_alert_response(),
    };

    match state.bank_client.create_link_token(&config, user_id).await {
        Ok(link_token) => Json(LinkTokenResponse { link_token }).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler that exchanges the Link widget's public token for an
/// access token and stores it on the user's profile.
pub async fn exchange_public_token_endpoint(
    State(state): State<BankState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExchangeForm>,
) -> Response {
    let config = match load_bank_config(&state) {
        Ok(config) => config,
        Err(error) => return error.into_alert_response(),
    };

    let access_token = match state
        .bank_client
        .exchange_public_token(&config, form.public_token.trim())
        .await
    {
        Ok(access_token) => access_token,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_bank_access_token(user_id, Some(&access_token), &connection) {
        Ok(()) => {
            tracing::info!("user {user_id} linked a bank account");
            redirect_to_account_page()
        }
        Err(error) => {
            tracing::error!("could not store bank access token: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler that imports the last 30 days of bank transactions.
///
/// Transactions that were already imported are skipped. Responds with an
/// alert reporting how many transactions were imported and skipped.
pub async fn import_bank_transactions_endpoint(
    State(state): State<BankState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let config = match load_bank_config(&state) {
        Ok(config) => config,
        Err(error) => return error.into_alert_response(),
    };

    let access_token = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match get_profile_or_default(user_id, &connection) {
            Ok(profile) => match profile.bank_access_token {
                Some(access_token) => access_token,
                None => return Error::BankNotLinked.into_alert_response(),
            },
            Err(error) => return error.into_alert_response(),
        }
    };

    let start_date = today - Duration::days(IMPORT_WINDOW_DAYS);
    let bank_transactions = match state
        .bank_client
        .get_transactions(&config, &access_token, start_date, today)
        .await
    {
        Ok(transactions) => transactions,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let summary = match import_bank_transactions(user_id, &bank_transactions, &connection)
        .and_then(|summary| set_bank_last_import(user_id, today, &connection).map(|_| summary))
    {
        Ok(summary) => summary,
        Err(error) => {
            tracing::error!("could not import bank transactions: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!(
        "imported {} bank transactions for user {user_id}, skipped {}",
        summary.imported,
        summary.skipped
    );

    Alert::Success {
        message: format!("Imported {} transactions", summary.imported),
        details: format!(
            "{} transactions were skipped because they were already imported or invalid.",
            summary.skipped
        ),
    }
    .into_response()
}

/// A route handler that forgets the user's bank access token.
pub async fn unlink_bank_endpoint(
    State(state): State<BankState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_bank_access_token(user_id, None, &connection) {
        Ok(()) => redirect_to_account_page(),
        Err(error) => {
            tracing::error!("could not unlink bank account: {error}");
            error.into_alert_response()
        }
    }
}
