//! Operator channel: outbound notifications and inbound bot commands.
//!
//! The loops only see the [`Notifier`] and [`CommandSource`] traits,
//! [`TelegramClient`] implements both on top of the Bot API.

mod client;
mod types;

use core::{future::Future, time::Duration};

pub use client::{DEFAULT_API_URL, SEND_TIMEOUT, TelegramClient, TelegramError};
pub use types::{Chat, ChatId, ChatKind, Message, Update};

/// Fire-and-forget message sink.
pub trait Notifier: Send + Sync {
    /// Sends `text` to `destination`, or to the default chat when `None`.
    ///
    /// Delivery failures are logged by the implementation and never returned.
    fn notify(&self, text: &str, destination: Option<ChatId>) -> impl Future<Output = ()> + Send;
}

/// Long-poll source of operator commands.
pub trait CommandSource: Send + Sync {
    /// Whether the source holds the credential it needs to poll at all.
    fn has_credential(&self) -> bool;

    /// Fetches updates with an id of at least `offset`.
    ///
    /// `wait` is how long the server may hold the request open, `timeout`
    /// bounds the whole call and must exceed `wait`.
    fn fetch_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<Update>, TelegramError>> + Send;
}
