//! Tenant data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::TenantId;
use uuid::Uuid;

use crate::TenantError;

/// A shop hosted on the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: TenantId,
    /// URL-safe handle, unique across the platform
    pub slug: String,
    /// Display name
    pub name: String,
    /// Lifecycle status
    pub status: TenantStatus,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Last modified
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Build a new active tenant from a validated request
    pub fn create(request: NewTenant) -> Result<Self, TenantError> {
        let slug = normalize_slug(&request.slug)?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(TenantError::Invalid("name cannot be empty".into()));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            slug,
            name,
            status: TenantStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the tenant may serve requests
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    pub(crate) fn set_status(&mut self, status: TenantStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Tenant lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Serving traffic
    Active,
    /// Temporarily blocked (e.g. unpaid)
    Suspended,
    /// Closed by the owner
    Inactive,
}

/// Tenant creation request
#[derive(Debug, Clone, Deserialize)]
pub struct NewTenant {
    /// Desired slug
    pub slug: String,
    /// Display name
    pub name: String,
}

/// Lower-case and validate a slug: `[a-z0-9-]`, 2..=63 chars, no leading/trailing dash
pub fn normalize_slug(raw: &str) -> Result<String, TenantError> {
    let slug = raw.trim().to_lowercase();

    if slug.len() < 2 || slug.len() > 63 {
        return Err(TenantError::Invalid("slug must be 2-63 characters".into()));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(TenantError::Invalid(
            "slug may only contain letters, digits and dashes".into(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(TenantError::Invalid("slug cannot start or end with a dash".into()));
    }

    Ok(slug)
}
