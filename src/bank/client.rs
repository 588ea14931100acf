//! Client for the bank aggregation provider's (Plaid-compatible) HTTP API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::Date;

use crate::{Error, admin_config::BankConfig, auth::UserID};

/// The name shown to users in the bank's Link widget.
const CLIENT_NAME: &str = "FinDice";

/// The most transactions requested in a single import.
const MAX_TRANSACTION_COUNT: u32 = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A transaction as reported by the bank aggregation provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankTransaction {
    pub transaction_id: String,
    /// Positive for money leaving the account, negative for money coming in.
    pub amount: f64,
    /// The posting date as `YYYY-MM-DD`.
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub merchant_name: Option<String>,
    /// The legacy category hierarchy, e.g. `["Food and Drink", "Restaurants"]`.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub personal_finance_category: Option<PersonalFinanceCategory>,
}

/// The provider's current categorisation, e.g. `FOOD_AND_DRINK`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalFinanceCategory {
    pub primary: String,
    #[serde(default)]
    pub detailed: Option<String>,
}

/// Sends requests to the bank aggregation provider.
///
/// The credentials are passed to each call since they are stored in the
/// database and may change while the server is running.
#[derive(Debug, Clone)]
pub struct BankClient {
    client: Client,
}

impl BankClient {
    /// # Errors
    /// Returns [Error::BankRequest] if the HTTP client could not be built.
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::BankRequest(format!("failed to build HTTP client: {error}")))?;

        Ok(Self { client })
    }

    /// Create a link token used by the client-side Link widget for `user_id`.
    pub async fn create_link_token(
        &self,
        config: &BankConfig,
        user_id: UserID,
    ) -> Result<String, Error> {
        let request = LinkTokenRequest {
            client_id: &config.client_id,
            secret: &config.secret,
            client_name: CLIENT_NAME,
            user: LinkTokenUser {
                client_user_id: user_id.as_i64().to_string(),
            },
            products: &["transactions"],
            country_codes: &["US"],
            language: "en",
        };

        let response: LinkTokenResponse = self
            .post(config, "/link/token/create", &request)
            .await?;

        Ok(response.link_token)
    }

    /// Exchange the public token from the Link widget for a long-lived access token.
    pub async fn exchange_public_token(
        &self,
        config: &BankConfig,
        public_token: &str,
    ) -> Result<String, Error> {
        let request = PublicTokenExchangeRequest {
            client_id: &config.client_id,
            secret: &config.secret,
            public_token,
        };

        let response: PublicTokenExchangeResponse = self
            .post(config, "/item/public_token/exchange", &request)
            .await?;

        Ok(response.access_token)
    }

    /// Get the transactions posted between `start_date` and `end_date` inclusive.
    pub async fn get_transactions(
        &self,
        config: &BankConfig,
        access_token: &str,
        start_date: Date,
        end_date: Date,
    ) -> Result<Vec<BankTransaction>, Error> {
        let request = TransactionsRequest {
            client_id: &config.client_id,
            secret: &config.secret,
            access_token,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            options: TransactionsOptions {
                count: MAX_TRANSACTION_COUNT,
                offset: 0,
            },
        };

        let response: TransactionsResponse =
            self.post(config, "/transactions/get", &request).await?;

        Ok(response.transactions)
    }

    async fn post<Request, Response>(
        &self,
        config: &BankConfig,
        path: &str,
        request: &Request,
    ) -> Result<Response, Error>
    where
        Request: Serialize,
        Response: DeserializeOwned,
    {
        let url = format!("{}{path}", config.environment.base_url());
        tracing::debug!(%url, "sending bank request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(%url, %error, "bank request failed");
                Error::BankRequest(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_owned());
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => format!(
                    "HTTP {status} {}: {}",
                    error.error_code, error.error_message
                ),
                Err(_) => format!("HTTP {status}: {body}"),
            };

            tracing::error!(%url, %message, "bank request returned an error");
            return Err(Error::BankRequest(message));
        }

        response.json::<Response>().await.map_err(|error| {
            tracing::error!(%url, %error, "could not parse bank response");
            Error::BankRequest(format!("failed to parse response body: {error}"))
        })
    }
}

#[derive(Debug, Serialize)]
struct LinkTokenUser {
    client_user_id: String,
}

#[derive(Debug, Serialize)]
struct LinkTokenRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    client_name: &'a str,
    user: LinkTokenUser,
    products: &'a [&'a str],
    country_codes: &'a [&'a str],
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct LinkTokenResponse {
    link_token: String,
}

#[derive(Debug, Serialize)]
struct PublicTokenExchangeRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    public_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct PublicTokenExchangeResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct TransactionsOptions {
    count: u32,
    offset: u32,
}

#[derive(Debug, Serialize)]
struct TransactionsRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    start_date: String,
    end_date: String,
    options: TransactionsOptions,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<BankTransaction>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_code: String,
    error_message: String,
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::admin_config::{BankConfig, BankEnvironment};

    pub(crate) const TEST_ACCESS_TOKEN: &str = "access-sandbox-123";
    pub(crate) const TEST_PUBLIC_TOKEN: &str = "public-sandbox-123";

    fn check_credentials(body: &Value) -> Result<(), (StatusCode, Json<Value>)> {
        if body["client_id"] == "client" && body["secret"] == "secret" {
            Ok(())
        } else {
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error_type": "INVALID_INPUT",
                    "error_code": "INVALID_API_KEYS",
                    "error_message": "invalid client_id or secret provided"
                })),
            ))
        }
    }

    async fn link_token(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        check_credentials(&body)?;
        let user_id = body["user"]["client_user_id"].as_str().unwrap_or_default();

        Ok(Json(json!({ "link_token": format!("link-sandbox-{user_id}") })))
    }

    async fn exchange(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        check_credentials(&body)?;

        if body["public_token"] != TEST_PUBLIC_TOKEN {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error_code": "INVALID_PUBLIC_TOKEN",
                    "error_message": "provided public token is in an invalid format"
                })),
            ));
        }

        Ok(Json(json!({ "access_token": TEST_ACCESS_TOKEN, "item_id": "item-1" })))
    }

    async fn transactions(
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        check_credentials(&body)?;

        if body["access_token"] != TEST_ACCESS_TOKEN {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error_code": "INVALID_ACCESS_TOKEN",
                    "error_message": "provided access token is in an invalid format"
                })),
            ));
        }

        Ok(Json(json!({
            "transactions": [
                {
                    "transaction_id": "bank-1",
                    "amount": 12.5,
                    "date": "2025-03-02",
                    "name": "SQ *CAFE",
                    "merchant_name": "Corner Cafe",
                    "category": ["Food and Drink", "Restaurants"],
                    "personal_finance_category": { "primary": "FOOD_AND_DRINK" }
                },
                {
                    "transaction_id": "bank-2",
                    "amount": -1500.0,
                    "date": "2025-03-01",
                    "name": "ACME PAYROLL",
                    "category": ["Transfer", "Payroll"]
                },
                {
                    "transaction_id": "bank-3",
                    "amount": 900.75,
                    "date": "2025-03-01",
                    "name": "City Apartments",
                    "personal_finance_category": { "primary": "RENT_AND_UTILITIES" }
                }
            ],
            "total_transactions": 3
        })))
    }

    /// Start a fake bank aggregation API on a random local port and return
    /// credentials that point at it.
    pub(crate) async fn spawn_fake_bank() -> BankConfig {
        let app = Router::new()
            .route("/link/token/create", post(link_token))
            .route("/item/public_token/exchange", post(exchange))
            .route("/transactions/get", post(transactions));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        BankConfig {
            client_id: "client".to_owned(),
            secret: "secret".to_owned(),
            environment: BankEnvironment::Custom(format!("http://{address}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        bank::client::{
            BankClient,
            test_server::{TEST_ACCESS_TOKEN, TEST_PUBLIC_TOKEN, spawn_fake_bank},
        },
    };

    #[tokio::test]
    async fn creates_link_token_for_user() {
        let config = spawn_fake_bank().await;
        let client = BankClient::new().unwrap();

        let token = client
            .create_link_token(&config, UserID::new(42))
            .await
            .unwrap();

        assert_eq!(token, "link-sandbox-42");
    }

    #[tokio::test]
    async fn exchanges_public_token() {
        let config = spawn_fake_bank().await;
        let client = BankClient::new().unwrap();

        let access_token = client
            .exchange_public_token(&config, TEST_PUBLIC_TOKEN)
            .await
            .unwrap();

        assert_eq!(access_token, TEST_ACCESS_TOKEN);
    }

    #[tokio::test]
    async fn gets_transactions() {
        let config = spawn_fake_bank().await;
        let client = BankClient::new().unwrap();

        let transactions = client
            .get_transactions(
                &config,
                TEST_ACCESS_TOKEN,
                date!(2025 - 02 - 01),
                date!(2025 - 03 - 03),
            )
            .await
            .unwrap();

        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0].transaction_id, "bank-1");
        assert_eq!(transactions[0].merchant_name.as_deref(), Some("Corner Cafe"));
        assert_eq!(transactions[1].amount, -1500.0);
        assert_eq!(transactions[2].category, None);
    }

    #[tokio::test]
    async fn provider_errors_include_the_error_code() {
        let mut config = spawn_fake_bank().await;
        config.secret = "wrong".to_owned();
        let client = BankClient::new().unwrap();

        let result = client.create_link_token(&config, UserID::new(1)).await;

        assert!(
            matches!(&result, Err(Error::BankRequest(message)) if message.contains("INVALID_API_KEYS")),
            "got {result:?}"
        );
    }
}
