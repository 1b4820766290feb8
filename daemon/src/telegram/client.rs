//! HTTP client for the Telegram Bot API.

use core::time::Duration;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use thiserror::Error as ThisError;
use tracing::{debug, error, warn};

use super::{
    ChatId, CommandSource, Notifier, Update,
    types::{ApiResponse, GetUpdates, SendMessage},
};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Upper bound for a single `sendMessage` call.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, ThisError)]
pub enum TelegramError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request to the Bot API failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Bot API rejected the request (HTTP {status}): {description}")]
    Api { status: u16, description: String },
    #[error("Bot API answered HTTP {0} without a readable body")]
    Status(u16),
    #[error("Failed to decode Bot API response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("No bot token configured")]
    MissingToken,
}

/// Talks to one bot. Cheap to share behind an `Arc`: the underlying
/// connection pool is safe for concurrent use by both loops.
#[derive(Debug)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<SecretString>,
    default_chat: Option<ChatId>,
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_url: &str,
        token: Option<SecretString>,
        default_chat: Option<ChatId>,
    ) -> Result<Self, TelegramError> {
        crate::init_rustls();
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(TelegramError::Client)?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token,
            default_chat,
        })
    }

    /// Sends `text` to `chat_id` with HTML formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the Bot API rejects it.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        let request = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };
        self.call::<_, IgnoredAny>("sendMessage", &request, SEND_TIMEOUT)
            .await
            .map(drop)
    }

    /// Long-polls for updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out or the Bot API rejects it.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdates {
            offset,
            timeout: wait.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request, timeout).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.token.as_ref().ok_or(TelegramError::MissingToken)?;
        // the URL embeds the token, so it is stripped from every error
        let url = format!("{}/bot{}/{method}", self.api_url, token.expose_secret());
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::Transport(e.without_url()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Transport(e.without_url()))?;

        match serde_json::from_slice::<ApiResponse<T>>(&bytes) {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Ok(ApiResponse { description, .. }) => Err(TelegramError::Api {
                status: status.as_u16(),
                description: description.unwrap_or_default(),
            }),
            Err(e) if status.is_success() => Err(TelegramError::Decode(e)),
            Err(_) => Err(TelegramError::Status(status.as_u16())),
        }
    }
}

impl Notifier for TelegramClient {
    async fn notify(&self, text: &str, destination: Option<ChatId>) {
        if self.token.is_none() {
            warn!("No bot token configured, dropping message");
            return;
        }
        let Some(chat_id) = destination.or(self.default_chat) else {
            warn!("No destination and no default chat configured, dropping message");
            return;
        };
        match self.send_message(chat_id, text).await {
            Ok(()) => debug!("Message delivered to chat {}", chat_id),
            Err(e) => error!("Failed to send message to chat {}: {}", chat_id, e),
        }
    }
}

impl CommandSource for TelegramClient {
    fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        self.get_updates(offset, wait, timeout).await
    }
}
