//! Administrator-managed configuration stored in the database.
//!
//! These rows hold the LLM API keys, the assistant's system prompts and the
//! bank aggregation credentials. They are edited with the `configure` binary.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::Error;

/// The LLM service used when no service name is given.
pub const DEFAULT_SERVICE_NAME: &str = "SAMBANOVA";

pub fn create_api_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS api_config (
                id INTEGER PRIMARY KEY,
                service_name TEXT NOT NULL UNIQUE DEFAULT 'SAMBANOVA',
                api_key TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

pub fn create_system_prompt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS system_prompt (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

pub fn create_bank_config_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // There is only ever one row, so the ID is fixed.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bank_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                client_id TEXT NOT NULL,
                secret TEXT NOT NULL,
                environment TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// An API key for an LLM service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// The name the key is looked up by, e.g. "SAMBANOVA".
    pub service_name: String,
    /// The secret sent as the bearer token.
    pub api_key: String,
}

/// Set the API key for `service_name`, replacing any existing key.
pub fn set_api_key(
    service_name: &str,
    api_key: &str,
    connection: &Connection,
) -> Result<ApiConfig, Error> {
    connection
        .prepare(
            "INSERT INTO api_config (service_name, api_key) VALUES (?1, ?2)
             ON CONFLICT(service_name) DO UPDATE SET api_key = excluded.api_key
             RETURNING service_name, api_key",
        )?
        .query_row((service_name, api_key), |row| {
            Ok(ApiConfig {
                service_name: row.get(0)?,
                api_key: row.get(1)?,
            })
        })
        .map_err(|error| error.into())
}

/// Get the API key for `service_name`, if one has been set.
pub fn get_api_key(service_name: &str, connection: &Connection) -> Result<Option<String>, Error> {
    connection
        .query_row(
            "SELECT api_key FROM api_config WHERE service_name = ?1",
            [service_name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

/// Get every configured API key, ordered by service name.
pub fn get_api_configs(connection: &Connection) -> Result<Vec<ApiConfig>, Error> {
    connection
        .prepare("SELECT service_name, api_key FROM api_config ORDER BY service_name")?
        .query_map([], |row| {
            Ok(ApiConfig {
                service_name: row.get(0)?,
                api_key: row.get(1)?,
            })
        })?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Instructions given to the assistant before the user's figures.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPrompt {
    /// The ID of the prompt in the application database.
    pub id: i64,
    /// A short name shown by the `configure` tool.
    pub name: String,
    /// The instructions themselves.
    pub content: String,
    /// When the prompt was added.
    pub created_at: OffsetDateTime,
}

/// Add a system prompt. The newest prompt is the active one.
pub fn add_system_prompt(
    name: &str,
    content: &str,
    connection: &Connection,
) -> Result<SystemPrompt, Error> {
    connection
        .prepare(
            "INSERT INTO system_prompt (name, content, created_at) VALUES (?1, ?2, ?3)
             RETURNING id, name, content, created_at",
        )?
        .query_row(
            (name, content, OffsetDateTime::now_utc()),
            map_system_prompt_row,
        )
        .map_err(|error| error.into())
}

/// Get the most recently added system prompt.
pub fn get_active_system_prompt(connection: &Connection) -> Result<Option<SystemPrompt>, Error> {
    connection
        .prepare(
            "SELECT id, name, content, created_at FROM system_prompt
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )?
        .query_row([], map_system_prompt_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get every system prompt, newest first.
pub fn get_system_prompts(connection: &Connection) -> Result<Vec<SystemPrompt>, Error> {
    connection
        .prepare(
            "SELECT id, name, content, created_at FROM system_prompt
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map([], map_system_prompt_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

fn map_system_prompt_row(row: &Row) -> Result<SystemPrompt, rusqlite::Error> {
    Ok(SystemPrompt {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Which bank aggregation deployment to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankEnvironment {
    /// Test credentials and fake institutions.
    Sandbox,
    /// Real institutions with a limited number of items.
    Development,
    /// Live data.
    Production,
    /// Any other deployment, given as its base URL.
    Custom(String),
}

impl BankEnvironment {
    /// The base URL requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        match self {
            BankEnvironment::Sandbox => "https://sandbox.plaid.com",
            BankEnvironment::Development => "https://development.plaid.com",
            BankEnvironment::Production => "https://production.plaid.com",
            BankEnvironment::Custom(url) => url.trim_end_matches('/'),
        }
    }

    /// Parse an environment name or a base URL.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "sandbox" => BankEnvironment::Sandbox,
            "development" => BankEnvironment::Development,
            "production" => BankEnvironment::Production,
            _ => BankEnvironment::Custom(value.trim().to_owned()),
        }
    }
}

impl Display for BankEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BankEnvironment::Sandbox => write!(f, "sandbox"),
            BankEnvironment::Development => write!(f, "development"),
            BankEnvironment::Production => write!(f, "production"),
            BankEnvironment::Custom(url) => write!(f, "{url}"),
        }
    }
}

/// The credentials for the bank aggregation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BankConfig {
    /// The client ID issued by the provider.
    pub client_id: String,
    /// The secret that goes with the client ID.
    pub secret: String,
    /// The deployment the credentials belong to.
    pub environment: BankEnvironment,
}

/// Set the bank aggregation credentials, replacing any existing ones.
pub fn set_bank_config(config: &BankConfig, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO bank_config (id, client_id, secret, environment) VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            client_id = excluded.client_id,
            secret = excluded.secret,
            environment = excluded.environment",
        (
            &config.client_id,
            &config.secret,
            config.environment.to_string(),
        ),
    )?;

    Ok(())
}

/// Get the bank aggregation credentials, if they have been set.
pub fn get_bank_config(connection: &Connection) -> Result<Option<BankConfig>, Error> {
    connection
        .query_row(
            "SELECT client_id, secret, environment FROM bank_config WHERE id = 1",
            [],
            |row| {
                Ok(BankConfig {
                    client_id: row.get(0)?,
                    secret: row.get(1)?,
                    environment: BankEnvironment::parse(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(|error| error.into())
}

/// Hide all but the last four characters of `secret`.
pub fn mask_secret(secret: &str) -> String {
    let char_count = secret.chars().count();

    if char_count <= 4 {
        return "*".repeat(char_count);
    }

    let visible: String = secret.chars().skip(char_count - 4).collect();
    format!("{}{visible}", "*".repeat(char_count - 4))
}
