//! Error types for the notification registry
//!
//! Public operations never surface these: redundant or invalid calls degrade
//! to silent no-ops, and the fallible inner paths log at warn level instead.

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("severity not registered: '{label}'")]
    UnknownSeverity { label: String },

    #[error("no timer runtime available: {reason}")]
    TimerUnavailable { reason: String },
}

/// Result type for registry-internal operations
pub type NotificationResult<T> = Result<T, NotificationError>;
