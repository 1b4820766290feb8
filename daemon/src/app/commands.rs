//! Operator commands received through the bot.
//!
//! The listener long-polls the command source, answers `/ping` with a sweep
//! over the device registry and `/start` with a short help text. It owns its
//! cursor and shares nothing mutable with the link monitor.

use alloc::sync::Arc;

use futures::future;
use linkwatch_common::Prober;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{ShutdownRx, wait_for_shutdown};
use crate::{
    config::{Device, DeviceRegistry, ListenerConfig},
    telegram::{ChatKind, CommandSource, Notifier, TelegramError, Update},
};

pub(crate) const HELP_TEXT: &str = "Бот мониторинга связи с гаражом.\n\
    Уведомления о пропаже и восстановлении связи приходят автоматически.\n\n\
    Команды:\n\
    /ping - проверить доступность устройств\n\
    /start - эта справка";

const SWEEP_HEADER: &str = "📡 <b>Статус устройств:</b>";

/// Commands the bot reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Ping,
    Start,
}

impl BotCommand {
    /// Parses the leading command of a message.
    ///
    /// Accepts the `/cmd@botname` form used in menus and ignores trailing
    /// arguments. Anything else is not a command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _)| name);
        match name {
            "ping" => Some(Self::Ping),
            "start" | "help" => Some(Self::Start),
            _ => None,
        }
    }
}

/// Probes every device concurrently. Results keep registry order.
pub async fn sweep<'reg, P: Prober>(
    prober: &P,
    devices: &'reg DeviceRegistry,
) -> Vec<(&'reg Device, bool)> {
    let checks = devices
        .iter()
        .map(|device| async move { (device, prober.probe(&device.address).await) });
    future::join_all(checks).await
}

/// One status line per device, without markup.
#[must_use]
pub fn device_line(device: &Device, reachable: bool) -> String {
    let glyph = if reachable { "✅" } else { "❌" };
    format!("{glyph} {} ({})", device.label, device.address)
}

/// Sweep reply in the bot's HTML parse mode.
#[must_use]
pub fn render_sweep(results: &[(&Device, bool)]) -> String {
    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(SWEEP_HEADER.to_owned());
    lines.extend(
        results
            .iter()
            .map(|&(device, reachable)| escape_html(&device_line(device, reachable))),
    );
    lines.join("\n")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Long-poll loop state: the cursor plus handles to the shared collaborators.
pub struct CommandListener<S, P, N> {
    source: Arc<S>,
    prober: Arc<P>,
    notifier: Arc<N>,
    devices: DeviceRegistry,
    config: ListenerConfig,
    cursor: Option<i64>,
}

impl<S, P, N> CommandListener<S, P, N>
where
    S: CommandSource,
    P: Prober,
    N: Notifier,
{
    /// Starts "from now": the first poll carries no cursor.
    pub const fn new(
        source: Arc<S>,
        prober: Arc<P>,
        notifier: Arc<N>,
        devices: DeviceRegistry,
        config: ListenerConfig,
    ) -> Self {
        Self {
            source,
            prober,
            notifier,
            devices,
            config,
            cursor: None,
        }
    }

    /// Offset the next poll will ask for.
    pub const fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Fetches one batch and handles every update in it.
    ///
    /// Returns how many updates were seen. On error the cursor is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the command source could not be polled.
    pub async fn poll_once(&mut self) -> Result<usize, TelegramError> {
        let updates = self
            .source
            .fetch_updates(self.cursor, self.config.poll_wait, self.config.poll_timeout)
            .await?;

        for update in &updates {
            let next = update.update_id.saturating_add(1);
            self.cursor = Some(self.cursor.map_or(next, |cursor| cursor.max(next)));
            self.handle_update(update).await;
        }
        Ok(updates.len())
    }

    async fn handle_update(&self, update: &Update) {
        let Some(message) = update.message.as_ref() else {
            debug!("Skipping update {} without message", update.update_id);
            return;
        };
        let Some(text) = message.text.as_deref() else {
            debug!("Skipping update {} without text", update.update_id);
            return;
        };
        if message.chat.kind != ChatKind::Private {
            debug!(
                "Skipping update {} from non-private chat {}",
                update.update_id, message.chat.id
            );
            return;
        }
        let Some(command) = BotCommand::parse(text) else {
            debug!("Ignoring unrecognized message in chat {}", message.chat.id);
            return;
        };

        info!(chat = %message.chat.id, ?command, "Handling command");
        let reply = match command {
            BotCommand::Ping => render_sweep(&sweep(&*self.prober, &self.devices).await),
            BotCommand::Start => HELP_TEXT.to_owned(),
        };
        self.notifier.notify(&reply, Some(message.chat.id)).await;
    }

    /// Background task: polls until `shutdown` fires.
    ///
    /// A failed poll is logged and retried with the same cursor after the backoff.
    #[tracing::instrument(skip_all, name = "commands")]
    pub async fn run(mut self, mut shutdown: ShutdownRx) {
        if !self.source.has_credential() {
            error!("No bot token configured, command listener not started");
            return;
        }
        info!(
            "Listening for commands, {} devices registered",
            self.devices.len()
        );
        loop {
            let polled = tokio::select! {
                polled = self.poll_once() => polled,
                () = wait_for_shutdown(&mut shutdown) => break,
            };
            match polled {
                Ok(seen) => debug!("Handled {} updates, cursor now {:?}", seen, self.cursor),
                Err(e) => {
                    warn!(
                        "Polling for commands failed, retrying in {:?}: {}",
                        self.config.backoff, e
                    );
                    tokio::select! {
                        () = sleep(self.config.backoff) => {}
                        () = wait_for_shutdown(&mut shutdown) => break,
                    }
                }
            }
        }
        info!("Command listener stopped");
    }
}
