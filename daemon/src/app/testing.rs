//! Scripted collaborators for the loop tests.

use alloc::collections::VecDeque;
use core::time::Duration;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use linkwatch_common::Prober;
use serde_json::json;
use tokio::time::{Instant, sleep};

use crate::telegram::{ChatId, CommandSource, Notifier, TelegramError, Update};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("test mutex poisoned")
}

/// Answers from a queue of outcomes, or per address, then falls back to a fixed answer.
#[derive(Debug, Default)]
pub(crate) struct ScriptedProber {
    queue: Mutex<VecDeque<bool>>,
    by_address: HashMap<String, bool>,
    fallback: bool,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub(crate) fn new(outcomes: &[bool], fallback: bool) -> Self {
        Self {
            queue: Mutex::new(outcomes.iter().copied().collect()),
            fallback,
            ..Self::default()
        }
    }

    pub(crate) fn by_address(outcomes: &[(&str, bool)], fallback: bool) -> Self {
        Self {
            by_address: outcomes
                .iter()
                .map(|&(address, reachable)| (address.to_owned(), reachable))
                .collect(),
            fallback,
            ..Self::default()
        }
    }

    pub(crate) fn probed(&self) -> Vec<String> {
        lock(&self.probed).clone()
    }
}

impl Prober for ScriptedProber {
    async fn probe(&self, address: &str) -> bool {
        lock(&self.probed).push(address.to_owned());
        if let Some(&reachable) = self.by_address.get(address) {
            return reachable;
        }
        lock(&self.queue).pop_front().unwrap_or(self.fallback)
    }
}

/// Remembers every message instead of sending it.
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(String, Option<ChatId>)>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<(String, Option<ChatId>)> {
        lock(&self.sent).clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str, destination: Option<ChatId>) {
        lock(&self.sent).push((text.to_owned(), destination));
    }
}

/// Hands out scripted poll results, then behaves like an idle long poll.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    without_credential: bool,
    batches: Mutex<VecDeque<Result<Vec<Update>, TelegramError>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    polled_at: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub(crate) fn new(batches: Vec<Result<Vec<Update>, TelegramError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            ..Self::default()
        }
    }

    /// A source that reports a missing credential and must never be polled.
    pub(crate) fn without_credential() -> Self {
        Self {
            without_credential: true,
            ..Self::default()
        }
    }

    pub(crate) fn offsets(&self) -> Vec<Option<i64>> {
        lock(&self.offsets).clone()
    }

    pub(crate) fn polled_at(&self) -> Vec<Instant> {
        lock(&self.polled_at).clone()
    }
}

impl CommandSource for ScriptedSource {
    fn has_credential(&self) -> bool {
        !self.without_credential
    }

    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        wait: Duration,
        _timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        lock(&self.offsets).push(offset);
        lock(&self.polled_at).push(Instant::now());
        let next = lock(&self.batches).pop_front();
        match next {
            Some(batch) => batch,
            None => {
                sleep(wait).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Text message update as the Bot API would deliver it.
pub(crate) fn text_update(update_id: i64, chat_id: i64, chat_type: &str, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "text": text,
            "chat": {"id": chat_id, "type": chat_type},
        },
    }))
    .expect("valid update")
}
