//! Public API for the notification registry
//!
//! This module provides the complete public API for the notification
//! registry. External modules should import from here rather than directly
//! from internal modules.

use std::sync::LazyLock;

pub use crate::notifications::emitter::Subscription;
pub use crate::notifications::error::NotificationError;
pub use crate::notifications::message::{Message, MessageOptions, Ttl};
pub use crate::notifications::registry::{NotificationRegistry, RegistryDefaults};

/// Global notification registry instance
static NOTIFICATION_SERVICE: LazyLock<NotificationRegistry> = LazyLock::new(|| {
    log::trace!("Initializing shared notification registry");
    NotificationRegistry::new()
});

/// Access the process-wide shared notification registry
///
/// Returns the same instance on every call. Embedders that want an isolated
/// message list construct their own [`NotificationRegistry`] instead.
///
/// # Examples
/// ```no_run
/// use noticeboard::notifications::api::get_notification_service;
///
/// let registry = get_notification_service();
/// registry.error("disk full", None);
/// ```
pub fn get_notification_service() -> &'static NotificationRegistry {
    &NOTIFICATION_SERVICE
}
