//! Client for OpenAI-compatible chat completion APIs (`/chat/completions`).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, assistant::core::ChatRole};

/// The default base URL of the chat completion API.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.sambanova.ai/v1";

/// The default model used for the assistant.
pub const DEFAULT_LLM_MODEL: &str = "Meta-Llama-3.1-8B-Instruct";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends conversations to a chat completion API and returns the reply.
///
/// Cheap to clone since `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    model: String,
    service_name: String,
}

impl ChatClient {
    /// Create a client for the API at `base_url`, e.g. "https://api.sambanova.ai/v1".
    ///
    /// `service_name` selects which configured API key is sent with requests.
    ///
    /// # Errors
    /// Returns [Error::LlmRequest] if the HTTP client could not be built.
    pub fn new(base_url: &str, model: &str, service_name: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::LlmRequest(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            service_name: service_name.to_owned(),
        })
    }

    /// The name of the service whose API key should be used.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Send `system_prompt` followed by `messages` and return the reply text.
    ///
    /// This is a single request, failures are not retried.
    ///
    /// # Errors
    /// Returns [Error::LlmRequest] if the request fails, the API responds with
    /// an error status or the reply is empty.
    pub async fn complete(
        &self,
        api_key: &str,
        system_prompt: &str,
        messages: &[(ChatRole, String)],
    ) -> Result<String, Error> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(Message {
            role: "system",
            content: system_prompt,
        });
        request_messages.extend(messages.iter().map(|(role, content)| Message {
            role: role.as_str(),
            content: content.as_str(),
        }));

        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: request_messages,
        };
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                tracing::error!(url = %url, error = %error, "chat completion request failed");
                Error::LlmRequest(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_owned());
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => format!("HTTP {status}: {}", envelope.error.message),
                Err(_) => format!("HTTP {status}: {body}"),
            };

            tracing::error!(%status, %message, "chat completion request returned an error");
            return Err(Error::LlmRequest(message));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|error| {
                tracing::error!(error = %error, "could not parse chat completion response");
                Error::LlmRequest(format!("failed to parse response body: {error}"))
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::LlmRequest("empty or missing content in response".to_owned()))
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    /// Start a fake chat completion API on a random local port and return its base URL.
    ///
    /// The reply echoes the number of messages received and the last message's
    /// content. Requests without the bearer token "test-key" are rejected.
    pub(crate) async fn spawn_fake_llm() -> String {
        async fn chat_completions(
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> (StatusCode, Json<Value>) {
            let authorized = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                == Some("Bearer test-key");

            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "invalid api key"}})),
                );
            }

            let messages = body["messages"].as_array().cloned().unwrap_or_default();
            let first_role = messages
                .first()
                .and_then(|message| message["role"].as_str())
                .unwrap_or_default()
                .to_owned();
            let last_content = messages
                .last()
                .and_then(|message| message["content"].as_str())
                .unwrap_or_default()
                .to_owned();

            (
                StatusCode::OK,
                Json(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": format!(
                                "{} messages, first {first_role}, you said: {last_content}",
                                messages.len()
                            )
                        }
                    }]
                })),
            )
        }

        let app = Router::new().route("/v1/chat/completions", post(chat_completions));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{address}/v1")
    }
}
