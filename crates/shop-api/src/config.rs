//! Server configuration
//!
//! Loaded from a JSON file, then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SHOP_CONFIG` | path of the JSON file (default `config/shop.json`) |
//! | `SHOP_BIND_ADDR` | `bind_addr` |
//! | `SHOP_JWT_SECRET` | `auth.jwt_secret` |
//! | `SHOP_PLATFORM_KEY` | `platform_key` |
//! | `SHOP_TENANT_HEADER` | `tenant_header` |
//! | `SHOP_ACCESS_TTL_SECS` | `auth.access_ttl_secs` |
//! | `SHOP_REFRESH_TTL_SECS` | `auth.refresh_ttl_secs` |

use serde::{Deserialize, Serialize};
use shop_identity::{HashingCost, TokenConfig};
use shop_notify::DispatcherConfig;
use shop_tenant::DEFAULT_TENANT_HEADER;
use thiserror::Error;

use crate::middleware::bruteforce::BruteforceConfig;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config/shop.json";

const MIN_SECRET_LEN: usize = 32;
/// Longest accepted token lifetime, one year
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address
    pub bind_addr: String,
    /// Relaxes secret checks; never enable in production
    pub dev_mode: bool,
    /// Shared key for `/api/v1/platform` (`x-platform-key` header)
    pub platform_key: String,
    /// Header carrying the tenant id or slug
    pub tenant_header: String,
    /// Tokens and password hashing
    pub auth: AuthConfig,
    /// Per-route attempt limits
    pub bruteforce: BruteforceConfig,
    /// Notification queue and retries
    pub notifications: DispatcherConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            dev_mode: false,
            platform_key: String::new(),
            tenant_header: DEFAULT_TENANT_HEADER.into(),
            auth: AuthConfig::default(),
            bruteforce: BruteforceConfig::default(),
            notifications: DispatcherConfig::default(),
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for JWTs
    pub jwt_secret: String,
    /// `iss` claim
    pub issuer: String,
    /// Access token lifetime
    pub access_ttl_secs: u64,
    /// Refresh token lifetime
    pub refresh_ttl_secs: u64,
    /// Argon2 work factors
    pub hashing: HashingCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let tokens = TokenConfig::default();
        Self {
            jwt_secret: String::new(),
            issuer: tokens.issuer,
            access_ttl_secs: tokens.access_ttl_secs,
            refresh_ttl_secs: tokens.refresh_ttl_secs,
            hashing: HashingCost::default(),
        }
    }
}

impl AuthConfig {
    /// Token service settings
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.issuer.clone(),
            access_ttl_secs: self.access_ttl_secs,
            refresh_ttl_secs: self.refresh_ttl_secs,
        }
    }
}

impl ApiConfig {
    /// Load from a JSON file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// File from `SHOP_CONFIG` (defaults if missing), then env overrides, then validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("SHOP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) => {
                tracing::warn!(%path, error = %e, "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SHOP_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("SHOP_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(secret) = lookup("SHOP_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(key) = lookup("SHOP_PLATFORM_KEY") {
            self.platform_key = key;
        }
        if let Some(header) = lookup("SHOP_TENANT_HEADER") {
            self.tenant_header = header.to_lowercase();
        }
        if let Some(ttl) = lookup("SHOP_ACCESS_TTL_SECS") {
            self.auth.access_ttl_secs = parse_secs("SHOP_ACCESS_TTL_SECS", &ttl)?;
        }
        if let Some(ttl) = lookup("SHOP_REFRESH_TTL_SECS") {
            self.auth.refresh_ttl_secs = parse_secs("SHOP_REFRESH_TTL_SECS", &ttl)?;
        }
        Ok(())
    }

    /// Reject settings the server cannot safely run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must be set".into()));
        }
        if !self.dev_mode && self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.tenant_header.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_header cannot be empty".into()));
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token lifetimes must be positive".into()));
        }
        if self.auth.access_ttl_secs > MAX_TTL_SECS || self.auth.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid(format!("token lifetimes cannot exceed {MAX_TTL_SECS} seconds")));
        }
        if self.platform_key.is_empty() {
            tracing::warn!("platform_key is empty, platform routes are disabled");
        }
        Ok(())
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a number of seconds, got {raw:?}")))
}
