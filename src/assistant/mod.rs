//! The AI financial assistant.
//!
//! Users chat with an LLM that is given their current figures in the system
//! prompt. The conversation is stored so that recent messages can be sent as
//! context with each new message.

mod assistant_page;
mod chat_endpoint;
mod client;
mod core;
mod prompt;

pub use assistant_page::get_assistant_page;
pub use chat_endpoint::{clear_chat_endpoint, send_chat_message_endpoint};
pub use client::{ChatClient, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};
pub use core::create_chat_message_table;

#[cfg(test)]
pub use assistant_page::AssistantState;
#[cfg(test)]
pub use core::{
    ChatRole, add_chat_message, clear_chat_history, get_chat_history, get_recent_chat_messages,
};
