//! Endpoints for sending a message to the assistant and clearing the conversation.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    admin_config::{get_active_system_prompt, get_api_key},
    assistant::{
        assistant_page::AssistantState,
        core::{
            ChatRole, MAX_MESSAGE_LENGTH, add_chat_message, clear_chat_history,
            get_recent_chat_messages,
        },
        prompt::{DEFAULT_SYSTEM_PROMPT, build_system_prompt},
    },
    auth::UserID,
    dashboard::get_financial_summary,
    endpoints,
    timezone::get_local_date,
};

/// The number of earlier messages sent along with a new message.
pub const HISTORY_LIMIT: u64 = 10;

/// The form data for a message to the assistant.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

/// Everything read from the database before calling the chat API.
struct ChatContext {
    api_key: String,
    system_prompt: String,
    messages: Vec<(ChatRole, String)>,
}

fn validate_message(message: &str) -> Result<&str, Error> {
    let message = message.trim();

    if message.is_empty() {
        return Err(Error::EmptyChatMessage);
    }

    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::ChatMessageTooLong(MAX_MESSAGE_LENGTH));
    }

    Ok(message)
}

fn load_chat_context(
    user_id: UserID,
    message: &str,
    service_name: &str,
    today: Date,
    connection: &Connection,
) -> Result<ChatContext, Error> {
    let api_key = get_api_key(service_name, connection)?
        .filter(|api_key| !api_key.trim().is_empty())
        .ok_or_else(|| Error::MissingApiKey(service_name.to_owned()))?;

    let instructions = get_active_system_prompt(connection)?
        .map(|prompt| prompt.content)
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned());
    let summary = get_financial_summary(user_id, today, connection)?;

    let mut messages: Vec<_> = get_recent_chat_messages(user_id, HISTORY_LIMIT, connection)?
        .into_iter()
        .map(|message| (message.role, message.content))
        .collect();
    messages.push((ChatRole::User, message.to_owned()));

    Ok(ChatContext {
        api_key,
        system_prompt: build_system_prompt(&instructions, &summary),
        messages,
    })
}

fn store_exchange(
    user_id: UserID,
    message: &str,
    reply: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    add_chat_message(user_id, ChatRole::User, message, &transaction)?;
    add_chat_message(user_id, ChatRole::Assistant, reply, &transaction)?;
    transaction.commit()?;

    Ok(())
}

fn redirect_to_assistant_page() -> Response {
    (
        HxRedirect(endpoints::ASSISTANT_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler that sends the user's message with their figures and
/// recent history to the chat API and stores the exchange.
///
/// Nothing is stored if the chat API request fails.
pub async fn send_chat_message_endpoint(
    State(state): State<AssistantState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChatForm>,
) -> Response {
    let message = match validate_message(&form.message) {
        Ok(message) => message,
        Err(error) => return error.into_alert_response(),
    };

    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let context = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        match load_chat_context(
            user_id,
            message,
            state.chat_client.service_name(),
            today,
            &connection,
        ) {
            Ok(context) => context,
            Err(error) => return error.into_alert_response(),
        }
    };

    let reply = match state
        .chat_client
        .complete(&context.api_key, &context.system_prompt, &context.messages)
        .await
    {
        Ok(reply) => reply,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match store_exchange(user_id, message, &reply, &connection) {
        Ok(()) => redirect_to_assistant_page(),
        Err(error) => {
            tracing::error!("could not store chat messages: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting the user's conversation with the assistant.
pub async fn clear_chat_endpoint(
    State(state): State<AssistantState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match clear_chat_history(user_id, &connection) {
        Ok(_) => redirect_to_assistant_page(),
        Err(error) => {
            tracing::error!("could not clear chat history: {error}");
            error.into_alert_response()
        }
    }
}
