//! Message handles, time-to-live, and posting options

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::notifications::error::{NotificationError, NotificationResult};
use crate::notifications::registry::RegistryInner;

/// Time-to-live for a posted message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Auto-remove after the given duration; zero expires on the next tick
    After(Duration),
    /// Never auto-expire; the message stays until explicitly removed
    Never,
}

impl Ttl {
    /// Convenience constructor from integer milliseconds
    pub fn millis(ms: u64) -> Self {
        Ttl::After(Duration::from_millis(ms))
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::After(delay) => write!(f, "{}ms", delay.as_millis()),
            Ttl::Never => write!(f, "never"),
        }
    }
}

// Config files carry ttl as signed integer milliseconds, -1 meaning "never".
impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ttl::After(delay) => serializer.serialize_i64(delay.as_millis() as i64),
            Ttl::Never => serializer.serialize_i64(-1),
        }
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            -1 => Ok(Ttl::Never),
            ms if ms >= 0 => Ok(Ttl::After(Duration::from_millis(ms as u64))),
            other => Err(de::Error::custom(format!(
                "ttl must be -1 or a non-negative millisecond count, got {other}"
            ))),
        }
    }
}

/// Caller-supplied options for a single post
///
/// `ttl: None` means "use the registry default". An explicit
/// `Some(Ttl::After(Duration::ZERO))` expires immediately: an absent ttl and
/// a zero ttl are distinct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOptions {
    #[serde(default)]
    pub ttl: Option<Ttl>,
}

impl MessageOptions {
    pub fn with_ttl(ttl: Ttl) -> Self {
        Self { ttl: Some(ttl) }
    }
}

/// State a message holds only while live
struct MessageState {
    /// Back-reference to the owning registry; cleared on removal
    registry: Option<Weak<RegistryInner>>,
    /// Armed expiry timer, if any
    timer: Option<tokio::task::JoinHandle<()>>,
    /// Resolved time-to-live (caller option or registry default)
    ttl: Ttl,
}

struct MessageShared {
    id: u64,
    text: String,
    severity: String,
    posted_at: SystemTime,
    state: Mutex<MessageState>,
}

/// Handle to one posted notification
///
/// Handles are cheap to clone and share lifecycle state: removing or
/// cancelling through any clone affects the single underlying message.
#[derive(Clone)]
pub struct Message {
    shared: Arc<MessageShared>,
}

impl Message {
    pub(crate) fn new(
        id: u64,
        text: String,
        severity: String,
        ttl: Ttl,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            shared: Arc::new(MessageShared {
                id,
                text,
                severity,
                posted_at: SystemTime::now(),
                state: Mutex::new(MessageState {
                    registry: Some(registry),
                    timer: None,
                    ttl,
                }),
            }),
        }
    }

    /// Registry-assigned identifier, unique within the owning registry
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn text(&self) -> &str {
        &self.shared.text
    }

    pub fn severity(&self) -> &str {
        &self.shared.severity
    }

    /// Timestamp the message was posted
    pub fn posted_at(&self) -> SystemTime {
        self.shared.posted_at
    }

    /// Resolved time-to-live for this message
    pub fn ttl(&self) -> Ttl {
        self.shared.state.lock().unwrap().ttl
    }

    /// Whether the message has not yet been removed from its registry
    pub fn is_live(&self) -> bool {
        self.shared.state.lock().unwrap().registry.is_some()
    }

    /// Remove the message from its registry's list
    ///
    /// Disarms any pending expiry timer, splices the message out, and
    /// re-emits the `change` channel. Returns `None` if the message was
    /// already removed; a redundant call never emits a duplicate `change`.
    pub fn remove(&self) -> Option<Message> {
        let (registry, timer) = {
            let mut state = self.shared.state.lock().unwrap();
            let registry = state.registry.take()?;
            (registry.upgrade(), state.timer.take())
        };

        if let Some(timer) = timer {
            // Harmless when the expiry task itself is the caller: no awaits
            // remain on its path.
            timer.abort();
        }

        let registry = match registry {
            Some(registry) => registry,
            None => {
                log::trace!("Message {} outlived its registry", self.shared.id);
                return None;
            }
        };

        if !registry.splice_out(self.shared.id) {
            log::trace!(
                "Message {} no longer present in the registry list",
                self.shared.id
            );
            return None;
        }

        log::debug!(
            "Removed message {} ({})",
            self.shared.id,
            self.shared.severity
        );
        registry.emit_change();
        Some(self.clone())
    }

    /// Arm (or re-arm) the expiry timer
    ///
    /// An override replaces the resolved ttl. Any previously armed timer is
    /// cancelled before a new one is armed, so at most one timer is live per
    /// message. `Ttl::Never` arms nothing, leaving the message permanent
    /// until an explicit `remove()`. No-op on an already-removed message.
    pub fn remove_after(&self, override_ttl: Option<Ttl>) -> Option<Message> {
        let mut state = self.shared.state.lock().unwrap();
        if state.registry.is_none() {
            return None;
        }
        if let Some(ttl) = override_ttl {
            state.ttl = ttl;
        }
        if let Some(previous) = state.timer.take() {
            previous.abort();
        }

        let delay = match state.ttl {
            Ttl::Never => return None,
            Ttl::After(delay) => delay,
        };

        match self.spawn_expiry(delay) {
            Ok(task) => {
                state.timer = Some(task);
                Some(self.clone())
            }
            Err(err) => {
                log::warn!(
                    "Expiry timer not armed for message {}: {err}",
                    self.shared.id
                );
                None
            }
        }
    }

    /// Cancel a pending expiry timer without removing the message
    ///
    /// Returns `None` if no timer is armed. The message stays in the list
    /// until an explicit `remove()` or a later `remove_after()`.
    pub fn cancel(&self) -> Option<Message> {
        let timer = self.shared.state.lock().unwrap().timer.take()?;
        timer.abort();
        log::trace!("Cancelled expiry timer for message {}", self.shared.id);
        Some(self.clone())
    }

    fn spawn_expiry(&self, delay: Duration) -> NotificationResult<tokio::task::JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            NotificationError::TimerUnavailable {
                reason: err.to_string(),
            }
        })?;

        let handle = self.clone();
        Ok(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            handle.remove();
        }))
    }
}

impl PartialEq for Message {
    /// Identity comparison: clones of the same posted message are equal
    fn eq(&self, other: &Self) -> bool {
        self.shared.id == other.shared.id
    }
}

impl Eq for Message {}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.shared.id)
            .field("severity", &self.shared.severity)
            .field("text", &self.shared.text)
            .field("live", &self.is_live())
            .finish()
    }
}
