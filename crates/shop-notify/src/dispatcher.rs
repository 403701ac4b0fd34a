//! Queue, worker, retries and delivery log

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shop_common::TenantId;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::{Channel, Message, NotificationEvent, NotificationKind};
use crate::provider::NotificationProvider;
use crate::template::{render, TemplateStore};
use crate::NotifyError;

/// Dispatcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Pending events before `enqueue` starts rejecting
    pub queue_capacity: usize,
    /// Send attempts per message
    pub max_attempts: u32,
    /// First retry delay; doubles on each retry
    pub base_delay_ms: u64,
    /// Delivery records kept in memory
    pub log_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 3,
            base_delay_ms: 200,
            log_capacity: 1000,
        }
    }
}

/// Final outcome of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// One message delivery (after retries)
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub kind: NotificationKind,
    pub channel: Channel,
    pub provider: String,
    pub to: String,
    pub subject: Option<String>,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

struct Inner {
    config: DispatcherConfig,
    templates: Arc<TemplateStore>,
    providers: HashMap<Channel, Arc<dyn NotificationProvider>>,
    log: RwLock<VecDeque<DeliveryRecord>>,
}

/// Entry point for sending notifications
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<Inner>,
    sender: mpsc::Sender<NotificationEvent>,
}

/// Background half; drive it with [`DispatchWorker::run`]
pub struct DispatchWorker {
    inner: Arc<Inner>,
    receiver: mpsc::Receiver<NotificationEvent>,
}

impl NotificationDispatcher {
    /// Build the dispatcher and its worker. One provider per channel; a later
    /// provider for the same channel replaces an earlier one.
    pub fn new(
        config: DispatcherConfig,
        templates: Arc<TemplateStore>,
        providers: Vec<Arc<dyn NotificationProvider>>,
    ) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let providers = providers.into_iter().map(|p| (p.channel(), p)).collect();

        let inner = Arc::new(Inner {
            config,
            templates,
            providers,
            log: RwLock::new(VecDeque::new()),
        });

        (
            Self { inner: Arc::clone(&inner), sender },
            DispatchWorker { inner, receiver },
        )
    }

    /// Queue an event without waiting
    pub fn enqueue(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(event) => {
                tracing::warn!(tenant_id = %event.tenant_id, kind = %event.kind, "notification queue full, dropping event");
                NotifyError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }

    /// Deliver immediately and return the records
    pub async fn dispatch_now(&self, event: NotificationEvent) -> Vec<DeliveryRecord> {
        self.inner.process(event).await
    }

    /// Delivery log for a tenant, newest first
    pub fn deliveries(&self, tenant_id: TenantId, limit: usize) -> Vec<DeliveryRecord> {
        self.inner
            .log
            .read()
            .iter()
            .rev()
            .filter(|r| r.tenant_id == tenant_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Template store shared with the worker
    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.inner.templates
    }
}

impl DispatchWorker {
    /// Process events until every dispatcher handle is dropped
    pub async fn run(mut self) {
        tracing::info!(channels = self.inner.providers.len(), "notification worker started");
        while let Some(event) = self.receiver.recv().await {
            self.inner.process(event).await;
        }
        tracing::info!("notification worker stopped");
    }
}

impl Inner {
    async fn process(&self, event: NotificationEvent) -> Vec<DeliveryRecord> {
        let mut records = Vec::new();

        for channel in Channel::ALL {
            let Some(to) = event.recipient.address(channel) else {
                continue;
            };
            let Some(provider) = self.providers.get(&channel) else {
                continue;
            };

            let template = self.templates.resolve(event.tenant_id, event.kind, channel);
            let message = Message {
                tenant_id: event.tenant_id,
                kind: event.kind,
                channel,
                to: to.to_string(),
                subject: template.subject.as_deref().map(|s| render(s, &event.variables)),
                body: render(&template.body, &event.variables),
            };

            let record = self.send_with_retry(provider.as_ref(), message).await;
            self.record(record.clone());
            records.push(record);
        }

        if records.is_empty() {
            tracing::debug!(tenant_id = %event.tenant_id, kind = %event.kind, "no deliverable channel for notification");
        }
        records
    }

    async fn send_with_retry(&self, provider: &dyn NotificationProvider, message: Message) -> DeliveryRecord {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < max_attempts {
            attempts += 1;
            match provider.send(&message).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        tenant_id = %message.tenant_id,
                        kind = %message.kind,
                        attempt = attempts,
                        error = %e,
                        "notification send failed"
                    );
                    last_error = Some(e.to_string());
                    if attempts < max_attempts {
                        let delay = self.config.base_delay_ms.saturating_mul(1u64 << (attempts - 1).min(16));
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let status = if last_error.is_none() { DeliveryStatus::Sent } else { DeliveryStatus::Failed };
        if status == DeliveryStatus::Failed {
            tracing::error!(
                provider = provider.name(),
                tenant_id = %message.tenant_id,
                kind = %message.kind,
                attempts,
                "notification gave up"
            );
        }

        DeliveryRecord {
            id: Uuid::new_v4(),
            tenant_id: message.tenant_id,
            kind: message.kind,
            channel: message.channel,
            provider: provider.name().to_string(),
            to: message.to,
            subject: message.subject,
            status,
            attempts,
            error: last_error,
            created_at: Utc::now(),
        }
    }

    fn record(&self, record: DeliveryRecord) {
        let mut log = self.log.write();
        log.push_back(record);
        while log.len() > self.config.log_capacity.max(1) {
            log.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Recipient;
    use crate::provider::MemoryProvider;

    fn config() -> DispatcherConfig {
        DispatcherConfig { queue_capacity: 8, max_attempts: 3, base_delay_ms: 1, log_capacity: 3 }
    }

    fn setup() -> (NotificationDispatcher, DispatchWorker, Arc<MemoryProvider>, Arc<MemoryProvider>) {
        let email = Arc::new(MemoryProvider::new(Channel::Email));
        let sms = Arc::new(MemoryProvider::new(Channel::Sms));
        let (dispatcher, worker) = NotificationDispatcher::new(
            config(),
            Arc::new(TemplateStore::new()),
            vec![
                email.clone() as Arc<dyn NotificationProvider>,
                sms.clone() as Arc<dyn NotificationProvider>,
            ],
        );
        (dispatcher, worker, email, sms)
    }

    fn order_created(tenant: TenantId, recipient: Recipient) -> NotificationEvent {
        NotificationEvent::new(tenant, NotificationKind::OrderCreated, recipient)
            .with_var("order_id", "A-1")
            .with_var("total", "USD 10.00")
            .with_var("shop", "Acme")
    }

    #[tokio::test]
    async fn test_dispatch_renders_per_channel() {
        let (dispatcher, _worker, email, sms) = setup();
        let tenant = Uuid::new_v4();
        let recipient = Recipient { email: Some("a@b.io".into()), phone: Some("+15550100".into()) };

        let records = dispatcher.dispatch_now(order_created(tenant, recipient)).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.status == DeliveryStatus::Sent));

        let mail = &email.sent()[0];
        assert_eq!(mail.subject.as_deref(), Some("Order A-1 received"));
        assert!(mail.body.contains("total USD 10.00"));
        assert_eq!(sms.sent()[0].body, "Acme: order A-1 received, total USD 10.00.");
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let (dispatcher, _worker, email, _) = setup();
        email.fail_next(2);

        let records = dispatcher
            .dispatch_now(order_created(Uuid::new_v4(), Recipient::email("a@b.io")))
            .await;
        assert_eq!(records[0].status, DeliveryStatus::Sent);
        assert_eq!(records[0].attempts, 3);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (dispatcher, _worker, email, _) = setup();
        email.fail_next(10);

        let records = dispatcher
            .dispatch_now(order_created(Uuid::new_v4(), Recipient::email("a@b.io")))
            .await;
        assert_eq!(records[0].status, DeliveryStatus::Failed);
        assert_eq!(records[0].attempts, 3);
        assert!(records[0].error.is_some());
    }

    #[tokio::test]
    async fn test_worker_drains_queue_and_log_is_bounded() {
        let (dispatcher, worker, email, _) = setup();
        let tenant = Uuid::new_v4();
        let handle = tokio::spawn(worker.run());

        for _ in 0..5 {
            dispatcher.enqueue(order_created(tenant, Recipient::email("a@b.io"))).unwrap();
        }
        for _ in 0..100 {
            if email.sent().len() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(email.sent().len(), 5);
        assert_eq!(dispatcher.deliveries(tenant, 10).len(), 3);
        assert!(dispatcher.deliveries(Uuid::new_v4(), 10).is_empty());

        drop(dispatcher);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_queue_full() {
        let (dispatcher, _worker, _, _) = setup();
        let tenant = Uuid::new_v4();
        for _ in 0..8 {
            dispatcher.enqueue(order_created(tenant, Recipient::email("a@b.io"))).unwrap();
        }
        assert_eq!(
            dispatcher.enqueue(order_created(tenant, Recipient::email("a@b.io"))),
            Err(NotifyError::QueueFull)
        );
    }
}
