//! In-process notification registry with per-message expiry
//!
//! Callers post short-lived status messages to a shared list, subscribers
//! are notified synchronously whenever the list changes, and each message
//! removes itself after its time-to-live unless cancelled.

pub mod notifications;
