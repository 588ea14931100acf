//! Exports the user's transactions as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{
        core::Transaction,
        query::{TransactionFilter, TransactionFilterQuery, query_transactions},
    },
};

/// The file name suggested to the browser for the download.
const EXPORT_FILE_NAME: &str = "transactions.csv";

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Write `transactions` as CSV with the header `date,type,category,description,amount`.
pub fn transactions_to_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["date", "type", "category", "description", "amount"])
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for transaction in transactions {
        writer
            .write_record([
                transaction.date.to_string(),
                transaction.transaction_type.as_str().to_owned(),
                transaction
                    .category
                    .map(|category| category.as_str().to_owned())
                    .unwrap_or_default(),
                transaction.description.clone(),
                format!("{:.2}", transaction.amount),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}

/// A route handler that downloads the user's transactions matching the
/// filters in the query string as a CSV file.
pub async fn export_transactions(
    State(state): State<ExportTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionFilterQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter::from_query(&query);

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        query_transactions(user_id, &filter, None, 0, &connection)?
    };

    let csv = transactions_to_csv(&transactions)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
