//! Storefront notifications
//!
//! Business events (registration, orders, payments) become email and SMS
//! messages. Message text comes from `{{ var }}` templates, with built-in
//! defaults that each tenant can override.
//!
//! ```text
//! enqueue(event) ──mpsc──► worker ──► TemplateStore::resolve ──► render
//!                                          │
//!                                          ▼
//!                              provider.send (retry + backoff)
//!                                          │
//!                                          ▼
//!                                    delivery log
//! ```

pub mod dispatcher;
pub mod event;
pub mod provider;
pub mod template;

use thiserror::Error;

pub use dispatcher::{DeliveryRecord, DeliveryStatus, DispatchWorker, DispatcherConfig, NotificationDispatcher};
pub use event::{Channel, Message, NotificationEvent, NotificationKind, Recipient};
pub use provider::{LogProvider, MemoryProvider, NotificationProvider};
pub use template::{render, Template, TemplateEntry, TemplateStore};

/// Notification errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// Queue at capacity; event dropped
    #[error("notification queue is full")]
    QueueFull,

    /// Worker has stopped
    #[error("notification queue is closed")]
    QueueClosed,

    /// Provider failed to deliver
    #[error("provider error: {0}")]
    Provider(String),

    /// Template rejected
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}
