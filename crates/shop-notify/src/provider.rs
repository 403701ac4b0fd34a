//! Delivery providers

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::event::{Channel, Message};
use crate::NotifyError;

/// Sends rendered messages over one channel
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Channel served
    fn channel(&self) -> Channel;

    /// Deliver one message
    async fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone)]
pub struct LogProvider {
    channel: Channel,
}

impl LogProvider {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NotificationProvider for LogProvider {
    fn name(&self) -> &str {
        match self.channel {
            Channel::Email => "log-email",
            Channel::Sms => "log-sms",
        }
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        tracing::info!(
            tenant_id = %message.tenant_id,
            kind = %message.kind,
            channel = %message.channel,
            to = %message.to,
            subject = message.subject.as_deref().unwrap_or(""),
            body = %message.body,
            "notification sent"
        );
        Ok(())
    }
}

/// Keeps messages in memory; can be told to fail the next N sends
#[derive(Debug)]
pub struct MemoryProvider {
    channel: Channel,
    sent: RwLock<Vec<Message>>,
    failures_left: AtomicU32,
}

impl MemoryProvider {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            sent: RwLock::new(Vec::new()),
            failures_left: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` sends
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Delivered messages
    pub fn sent(&self) -> Vec<Message> {
        self.sent.read().clone()
    }
}

#[async_trait]
impl NotificationProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(NotifyError::Provider("simulated provider outage".into()));
        }
        self.sent.write().push(message.clone());
        Ok(())
    }
}
