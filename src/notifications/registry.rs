//! NotificationRegistry implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::notifications::emitter::{Emitter, Subscription};
use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::message::{Message, MessageOptions, Ttl};

/// Fallback text used when a caller posts without a message body
const FALLBACK_MESSAGE: &str =
    "Something went wrong... The error has been recorded to make future improvements.";

/// Severities every registry recognizes from construction
const STOCK_SEVERITIES: [&str; 3] = ["error", "warn", "info"];

/// Construction-time defaults applied to posts that omit a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryDefaults {
    pub ttl: Ttl,
    pub severity: String,
    pub message: String,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            ttl: Ttl::millis(3000),
            severity: "error".to_string(),
            message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Shared registry internals
///
/// Messages hold a weak reference to this so they can splice themselves out
/// of the list and re-emit `change` without keeping the registry alive.
pub(crate) struct RegistryInner {
    next_id: AtomicU64,
    severities: Mutex<Vec<String>>,
    messages: Mutex<Vec<Message>>,
    defaults: RegistryDefaults,
    message_channel: Emitter<Message>,
    change_channel: Emitter<Vec<Message>>,
}

impl RegistryInner {
    /// Remove the message with `id` from the list. Returns false if it was
    /// not present.
    pub(crate) fn splice_out(&self, id: u64) -> bool {
        let mut messages = self.messages.lock().unwrap();
        match messages.iter().position(|message| message.id() == id) {
            Some(index) => {
                messages.remove(index);
                true
            }
            None => false,
        }
    }

    /// Re-emit the `change` channel with a snapshot of the current list
    pub(crate) fn emit_change(&self) {
        let snapshot = self.messages.lock().unwrap().clone();
        self.change_channel.emit(&snapshot);
    }
}

/// The notification registry: callers post messages to it, subscribers
/// listen on its `message` and `change` channels
///
/// Clones are cheap handles onto the same registry; they share the message
/// list, the severity set, and both channels.
#[derive(Clone)]
pub struct NotificationRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::with_defaults(RegistryDefaults::default())
    }

    pub fn with_defaults(defaults: RegistryDefaults) -> Self {
        log::trace!(
            "Creating notification registry (default ttl {}, severity '{}')",
            defaults.ttl,
            defaults.severity
        );
        let registry = Self {
            inner: Arc::new(RegistryInner {
                next_id: AtomicU64::new(1),
                severities: Mutex::new(Vec::new()),
                messages: Mutex::new(Vec::new()),
                defaults,
                message_channel: Emitter::new(),
                change_channel: Emitter::new(),
            }),
        };
        for severity in STOCK_SEVERITIES {
            registry.add_severity(severity);
        }
        registry
    }

    /// Register a severity label
    ///
    /// Idempotent; re-adding an existing label is accepted without error.
    /// Labels added here post through [`NotificationRegistry::shortcut`].
    pub fn add_severity(&self, label: &str) -> &Self {
        let mut severities = self.inner.severities.lock().unwrap();
        if !severities.iter().any(|registered| registered == label) {
            log::debug!("Registered severity '{label}'");
            severities.push(label.to_string());
        }
        self
    }

    /// Severity labels currently recognized, in registration order
    pub fn severities(&self) -> Vec<String> {
        self.inner.severities.lock().unwrap().clone()
    }

    /// Post a notification, returning the registry for chaining
    ///
    /// `None` (or an empty string) for `text` or `severity` falls back to
    /// the registry defaults, as does an options record without a ttl.
    pub fn log(
        &self,
        text: Option<&str>,
        options: Option<MessageOptions>,
        severity: Option<&str>,
    ) -> &Self {
        self.post(text, options, severity);
        self
    }

    /// Post a notification and hand back its [`Message`] handle
    ///
    /// The message is appended to the shared list and its expiry timer armed
    /// from the resolved ttl, then `message` fires with the new handle and
    /// `change` fires with the full list — exactly two notifications, in
    /// that order.
    pub fn post(
        &self,
        text: Option<&str>,
        options: Option<MessageOptions>,
        severity: Option<&str>,
    ) -> Message {
        let defaults = &self.inner.defaults;
        let text = match text {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => defaults.message.clone(),
        };
        let severity = match severity {
            Some(severity) if !severity.is_empty() => severity.to_string(),
            _ => defaults.severity.clone(),
        };
        let ttl = options.unwrap_or_default().ttl.unwrap_or(defaults.ttl);

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let message = Message::new(id, text, severity, ttl, Arc::downgrade(&self.inner));

        self.inner.messages.lock().unwrap().push(message.clone());
        message.remove_after(None);

        log::debug!(
            "Posted message {id} ({}, ttl {})",
            message.severity(),
            message.ttl()
        );
        self.inner.message_channel.emit(&message);
        self.inner.emit_change();

        message
    }

    /// Post with severity `error`
    pub fn error(&self, text: &str, options: Option<MessageOptions>) -> &Self {
        self.shortcut("error", text, options)
    }

    /// Post with severity `warn`
    pub fn warn(&self, text: &str, options: Option<MessageOptions>) -> &Self {
        self.shortcut("warn", text, options)
    }

    /// Post with severity `info`
    pub fn info(&self, text: &str, options: Option<MessageOptions>) -> &Self {
        self.shortcut("info", text, options)
    }

    /// Post through a registered severity label
    ///
    /// The generic form of the named shortcuts, covering severities added at
    /// runtime. An unregistered label does not post; the call degrades to a
    /// logged no-op.
    pub fn shortcut(&self, severity: &str, text: &str, options: Option<MessageOptions>) -> &Self {
        match self.check_severity(severity) {
            Ok(()) => self.log(Some(text), options, Some(severity)),
            Err(err) => {
                log::warn!("Dropped notification: {err}");
                self
            }
        }
    }

    fn check_severity(&self, label: &str) -> NotificationResult<()> {
        let severities = self.inner.severities.lock().unwrap();
        if severities.iter().any(|registered| registered == label) {
            Ok(())
        } else {
            Err(NotificationError::UnknownSeverity {
                label: label.to_string(),
            })
        }
    }

    /// Subscribe to the `change` channel
    ///
    /// The callback receives a snapshot of the full message list after every
    /// list mutation (post or removal). Consume the returned subscription to
    /// stop delivery.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Message]) + Send + Sync + 'static,
    {
        log::trace!("Subscribing to change channel");
        let id = self
            .inner
            .change_channel
            .on(move |messages: &Vec<Message>| callback(messages));
        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.change_channel.off(id);
            }
        })
    }

    /// Subscribe to the `message` channel
    ///
    /// The callback receives each newly posted [`Message`]. Consume the
    /// returned subscription to stop delivery.
    pub fn on_message<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        log::trace!("Subscribing to message channel");
        let id = self.inner.message_channel.on(callback);
        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.message_channel.off(id);
            }
        })
    }

    /// Snapshot of the current message list, in insertion order
    pub fn messages(&self) -> Vec<Message> {
        self.inner.messages.lock().unwrap().clone()
    }

    pub fn message_count(&self) -> usize {
        self.inner.messages.lock().unwrap().len()
    }

    pub fn defaults(&self) -> &RegistryDefaults {
        &self.inner.defaults
    }
}
