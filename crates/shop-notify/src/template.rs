//! `{{ var }}` templates: renderer, defaults and per-tenant overrides

use parking_lot::RwLock;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use shop_common::TenantId;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::event::{Channel, NotificationKind};
use crate::NotifyError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is a valid regex")
});

/// Replace every `{{ name }}` with its value; unknown names become empty
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Subject (email only) and body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

impl Template {
    fn new(subject: Option<&str>, body: &str) -> Self {
        Self { subject: subject.map(String::from), body: body.to_string() }
    }
}

/// Effective template for one (kind, channel)
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    pub kind: NotificationKind,
    pub channel: Channel,
    pub template: Template,
    /// Tenant override rather than the built-in default
    pub overridden: bool,
}

/// Built-in defaults plus tenant overrides
#[derive(Default)]
pub struct TemplateStore {
    overrides: RwLock<HashMap<(TenantId, NotificationKind, Channel), Template>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the template for a tenant
    pub fn upsert(
        &self,
        tenant_id: TenantId,
        kind: NotificationKind,
        channel: Channel,
        template: Template,
    ) -> Result<Template, NotifyError> {
        if template.body.trim().is_empty() {
            return Err(NotifyError::InvalidTemplate("body cannot be empty".into()));
        }
        let template = match channel {
            Channel::Email => Template {
                subject: template
                    .subject
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| default_template(kind, channel).subject),
                body: template.body,
            },
            Channel::Sms => Template { subject: None, body: template.body },
        };

        self.overrides
            .write()
            .insert((tenant_id, kind, channel), template.clone());
        tracing::info!(%tenant_id, %kind, %channel, "notification template overridden");
        Ok(template)
    }

    /// Drop an override; true if one existed
    pub fn remove(&self, tenant_id: TenantId, kind: NotificationKind, channel: Channel) -> bool {
        self.overrides.write().remove(&(tenant_id, kind, channel)).is_some()
    }

    /// Template used for this tenant
    pub fn resolve(&self, tenant_id: TenantId, kind: NotificationKind, channel: Channel) -> Template {
        self.overrides
            .read()
            .get(&(tenant_id, kind, channel))
            .cloned()
            .unwrap_or_else(|| default_template(kind, channel))
    }

    /// Every (kind, channel) with its effective template
    pub fn list(&self, tenant_id: TenantId) -> Vec<TemplateEntry> {
        let overrides = self.overrides.read();
        let mut entries = Vec::new();
        for kind in NotificationKind::ALL {
            for channel in Channel::ALL {
                let custom = overrides.get(&(tenant_id, kind, channel));
                entries.push(TemplateEntry {
                    kind,
                    channel,
                    template: custom.cloned().unwrap_or_else(|| default_template(kind, channel)),
                    overridden: custom.is_some(),
                });
            }
        }
        entries
    }
}

/// Built-in text
pub fn default_template(kind: NotificationKind, channel: Channel) -> Template {
    use Channel::*;
    use NotificationKind::*;

    match (kind, channel) {
        (UserRegistered, Email) => Template::new(
            Some("Welcome to {{ shop }}, {{ name }}"),
            "Hi {{ name }},\n\nYour account at {{ shop }} is ready. Sign in with {{ email }}.",
        ),
        (UserRegistered, Sms) => Template::new(None, "Welcome to {{ shop }}, {{ name }}!"),
        (OrderCreated, Email) => Template::new(
            Some("Order {{ order_id }} received"),
            "Thanks for shopping at {{ shop }}.\n\nOrder {{ order_id }}: {{ item_count }} item(s), total {{ total }}.",
        ),
        (OrderCreated, Sms) => Template::new(None, "{{ shop }}: order {{ order_id }} received, total {{ total }}."),
        (OrderStatusChanged, Email) => Template::new(
            Some("Order {{ order_id }} is now {{ status }}"),
            "Your order {{ order_id }} moved from {{ previous_status }} to {{ status }}.",
        ),
        (OrderStatusChanged, Sms) => Template::new(None, "{{ shop }}: order {{ order_id }} is now {{ status }}."),
        (PaymentCompleted, Email) => Template::new(
            Some("Payment received for order {{ order_id }}"),
            "We received your payment of {{ amount }} (reference {{ provider_ref }}).",
        ),
        (PaymentCompleted, Sms) => Template::new(None, "{{ shop }}: payment of {{ amount }} received."),
        (PaymentFailed, Email) => Template::new(
            Some("Payment failed for order {{ order_id }}"),
            "Your payment of {{ amount }} could not be processed: {{ reason }}.",
        ),
        (PaymentFailed, Sms) => Template::new(None, "{{ shop }}: payment for order {{ order_id }} failed."),
    }
}
