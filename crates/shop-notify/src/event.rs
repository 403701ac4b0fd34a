//! Notification events and rendered messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::TenantId;
use std::collections::BTreeMap;
use std::fmt;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    UserRegistered,
    OrderCreated,
    OrderStatusChanged,
    PaymentCompleted,
    PaymentFailed,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        Self::UserRegistered,
        Self::OrderCreated,
        Self::OrderStatusChanged,
        Self::PaymentCompleted,
        Self::PaymentFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user_registered",
            Self::OrderCreated => "order_created",
            Self::OrderStatusChanged => "order_status_changed",
            Self::PaymentCompleted => "payment_completed",
            Self::PaymentFailed => "payment_failed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Self::Email, Self::Sms];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Sms => f.write_str("sms"),
        }
    }
}

/// Where to send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    /// Email only
    pub fn email(address: impl Into<String>) -> Self {
        Self { email: Some(address.into()), phone: None }
    }

    /// Address for `channel`, if the recipient has one
    pub fn address(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => self.email.as_deref(),
            Channel::Sms => self.phone.as_deref(),
        }
        .filter(|a| !a.trim().is_empty())
    }
}

/// A business event to notify about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub tenant_id: TenantId,
    pub kind: NotificationKind,
    pub recipient: Recipient,
    /// Template variables
    pub variables: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(tenant_id: TenantId, kind: NotificationKind, recipient: Recipient) -> Self {
        Self {
            tenant_id,
            kind,
            recipient,
            variables: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Add a template variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.variables.insert(key.into(), value.to_string());
        self
    }
}

/// Rendered message handed to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub tenant_id: TenantId,
    pub kind: NotificationKind,
    pub channel: Channel,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}
