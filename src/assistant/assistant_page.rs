//! The assistant page showing the user's conversation and the message form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    admin_config::get_api_key,
    assistant::{
        client::ChatClient,
        core::{ChatMessage, ChatRole, MAX_MESSAGE_LENGTH, get_chat_history},
    },
    auth::UserID,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

/// The state needed for the assistant page and its endpoints.
#[derive(Debug, Clone)]
pub struct AssistantState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub chat_client: ChatClient,
}

impl FromRef<AppState> for AssistantState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            chat_client: state.chat_client.clone(),
        }
    }
}

fn chat_message_view(message: &ChatMessage) -> Markup {
    let (wrapper_style, bubble_style) = match message.role {
        ChatRole::User => (
            "flex justify-end",
            "max-w-[80%] px-4 py-2 rounded-lg bg-blue-600 text-white",
        ),
        ChatRole::Assistant => (
            "flex justify-start",
            "max-w-[80%] px-4 py-2 rounded-lg bg-gray-100 text-gray-900 \
            dark:bg-gray-700 dark:text-white",
        ),
    };

    html! {
        div class=(wrapper_style) data-role=(message.role.as_str())
        {
            p class={ (bubble_style) " whitespace-pre-wrap" } { (message.content) }
        }
    }
}

fn assistant_view(history: &[ChatMessage], is_configured: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::ASSISTANT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-4"
            {
                div class="flex items-center justify-between"
                {
                    h1 class="text-xl font-bold" { "Financial Assistant" }

                    @if !history.is_empty() {
                        button
                            hx-delete=(endpoints::CHAT_API)
                            hx-confirm="Are you sure you want to clear the conversation?"
                            hx-target-error="#alert-container"
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Clear conversation"
                        }
                    }
                }

                @if !is_configured {
                    p id="assistant-not-configured" class="p-4 text-sm text-yellow-800 rounded-lg bg-yellow-50 dark:bg-gray-800 dark:text-yellow-300"
                    {
                        "The assistant has not been set up yet. Ask the administrator to add an API key."
                    }
                }

                div id="chat-messages" class={ (CARD_STYLE) " flex flex-col gap-3 min-h-64" }
                {
                    @for message in history {
                        (chat_message_view(message))
                    }

                    @if history.is_empty() {
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            "Ask about your spending, budget or savings goal. "
                            "The assistant can see your totals, this month's budget and your goal."
                        }
                    }
                }

                form
                    hx-post=(endpoints::CHAT_API)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    hx-disabled-elt="find button"
                    class="flex flex-col gap-2"
                {
                    label for="message" class="sr-only" { "Message" }
                    textarea
                        name="message"
                        id="message"
                        rows="3"
                        maxlength=(MAX_MESSAGE_LENGTH)
                        required
                        placeholder="How can I save more each month?"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {}

                    button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="inline htmx-indicator" { (loading_spinner()) }
                        " Send"
                    }
                }
            }
        }
    };

    base("Assistant", &[], &content)
}

/// Renders the user's conversation with the assistant.
pub async fn get_assistant_page(
    State(state): State<AssistantState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let (history, is_configured) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_chat_history(user_id, &connection)?,
            get_api_key(state.chat_client.service_name(), &connection)?.is_some(),
        )
    };

    Ok(assistant_view(&history, is_configured).into_response())
}
