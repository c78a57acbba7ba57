//! Telegram Bot API message transport.

use async_trait::async_trait;
use tracing::{debug, instrument};

/// Default Telegram Bot API host.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A bot token plus the chat it posts to.
#[derive(Clone, PartialEq, Eq)]
pub struct BotDestination {
    pub token: String,
    pub chat_id: String,
}

impl BotDestination {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }
}

// Tokens must not end up in logs.
impl std::fmt::Debug for BotDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotDestination")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Failure delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("message request failed: {0}")]
    Transport(String),

    #[error("messaging API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Something that can deliver a text message to a [`BotDestination`].
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(
        &self,
        destination: &BotDestination,
        text: &str,
    ) -> Result<(), NotificationError>;
}

/// Telegram `sendMessage` client (Markdown parse mode).
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramTransport {
    /// Create a transport against the public Bot API.
    pub fn new() -> Self {
        Self::with_base_url(TELEGRAM_API_BASE)
    }

    /// Create a transport with custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn send_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.base_url.trim_end_matches('/'), token)
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    #[instrument(skip(self, destination, text), fields(chat_id = %destination.chat_id))]
    async fn send_message(
        &self,
        destination: &BotDestination,
        text: &str,
    ) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "chat_id": destination.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        // The request URL embeds the bot token; strip it from errors.
        let response = self
            .client
            .post(self.send_url(&destination.token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("Telegram message sent");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
