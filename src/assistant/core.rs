//! The stored conversation between a user and the assistant.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::OffsetDateTime;

use crate::{Error, auth::UserID};

/// The maximum number of characters in a message sent to the assistant.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// The role name used in the database and by chat completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl ToSql for ChatRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ChatRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(FromSqlError::Other(
                format!("unknown chat role {other}").into(),
            )),
        }
    }
}

/// One message in a user's conversation with the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: UserID,
    pub role: ChatRole,
    pub content: String,
    pub created_at: OffsetDateTime,
}

pub fn create_chat_message_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS chat_message (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_chat_message_user ON chat_message(user_id, id)",
        (),
    )?;

    Ok(())
}

/// Store a message in the conversation of `user_id`.
pub fn add_chat_message(
    user_id: UserID,
    role: ChatRole,
    content: &str,
    connection: &Connection,
) -> Result<ChatMessage, Error> {
    connection
        .prepare(
            "INSERT INTO chat_message (user_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, role, content, created_at",
        )?
        .query_row(
            (user_id.as_i64(), role, content, OffsetDateTime::now_utc()),
            map_chat_message_row,
        )
        .map_err(|error| error.into())
}

/// Get the whole conversation of `user_id`, oldest message first.
pub fn get_chat_history(user_id: UserID, connection: &Connection) -> Result<Vec<ChatMessage>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, role, content, created_at FROM chat_message
             WHERE user_id = ?1 ORDER BY id ASC",
        )?
        .query_map([user_id.as_i64()], map_chat_message_row)?
        .map(|result| result.map_err(Error::SqlError))
        .collect()
}

/// Get the last `count` messages of `user_id`, oldest message first.
pub fn get_recent_chat_messages(
    user_id: UserID,
    count: u64,
    connection: &Connection,
) -> Result<Vec<ChatMessage>, Error> {
    let mut messages = connection
        .prepare(
            "SELECT id, user_id, role, content, created_at FROM chat_message
             WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?
        .query_map((user_id.as_i64(), count as i64), map_chat_message_row)?
        .collect::<Result<Vec<_>, _>>()?;

    messages.reverse();

    Ok(messages)
}

/// Delete the conversation of `user_id`.
pub fn clear_chat_history(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM chat_message WHERE user_id = ?1",
            [user_id.as_i64()],
        )
        .map_err(|error| error.into())
}

fn map_chat_message_row(row: &Row) -> Result<ChatMessage, rusqlite::Error> {
    Ok(ChatMessage {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        role: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}
