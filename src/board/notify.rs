//! User-facing notifications raised by the reconciler.
//!
//! Nothing in the board core is fatal; failures end up here as a transient
//! message naming the reason, next to a refetch from the server.

use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::models::ItemId;
use crate::errors::RejectReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Machine-readable reason code for failures, e.g. `WIP_LIMIT_EXCEEDED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            code: None,
            item_id: None,
            at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// An error notification carrying the rejection's reason code.
    pub fn rejected(message: impl Into<String>, reason: &RejectReason) -> Self {
        let mut notification = Self::new(NotificationLevel::Error, message);
        notification.code = Some(reason.code().to_string());
        notification
    }

    pub fn for_item(mut self, item_id: &ItemId) -> Self {
        self.item_id = Some(item_id.clone());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to any number of subscribers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification); // Ignore error if no receivers
    }
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        let item = n.item_id.as_ref().map(|id| id.to_string());
        match n.level {
            NotificationLevel::Info => info!(item = ?item, "{}", n.message),
            NotificationLevel::Success => info!(item = ?item, "{}", n.message),
            NotificationLevel::Error => match n.code.as_deref() {
                Some(code) => warn!(item = ?item, code, "{}", n.message),
                None => error!(item = ?item, "{}", n.message),
            },
        }
    }
}

/// Prints notifications to stderr for the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let tag = match n.level {
            NotificationLevel::Info => style("info").cyan(),
            NotificationLevel::Success => style("ok").green(),
            NotificationLevel::Error => style("error").red().bold(),
        };
        match n.code {
            Some(code) => eprintln!("[{}] {} ({})", tag, n.message, code),
            None => eprintln!("[{}] {}", tag, n.message),
        }
    }
}
