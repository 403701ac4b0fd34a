//! JWT issuing, verification and refresh-token rotation

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shop_common::{TenantId, UserId};
use uuid::Uuid;

use crate::model::{Role, User};
use crate::IdentityError;

/// Token settings
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret
    pub secret: String,
    /// `iss` claim
    pub issuer: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production-change-me-now".into(),
            issuer: "shop-api".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
        }
    }
}

/// Which of the pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bearer credential for API calls
    Access,
    /// Exchanged for a new pair, once
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: UserId,
    /// Tenant the session belongs to
    pub tenant_id: TenantId,
    /// Roles at issue time
    pub roles: Vec<Role>,
    /// User email
    pub email: String,
    /// Access or refresh
    pub kind: TokenKind,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    /// Issuer
    pub iss: String,
}

/// Issued credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access JWT
    pub access_token: String,
    /// Refresh JWT
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Clone)]
struct RefreshEntry {
    user_id: UserId,
    expires_at: i64,
}

/// Signs and verifies tokens; tracks outstanding refresh tokens
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// sha256(jti) → owner
    refresh_tokens: DashMap<String, RefreshEntry>,
}

impl TokenService {
    /// Create from config
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
            refresh_tokens: DashMap::new(),
        }
    }

    /// Issue an access + refresh pair for `user`
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, IdentityError> {
        let access = self.claims_for(user, TokenKind::Access, self.config.access_ttl_secs)?;
        let refresh = self.claims_for(user, TokenKind::Refresh, self.config.refresh_ttl_secs)?;

        let access_token = self.sign(&access)?;
        let refresh_token = self.sign(&refresh)?;

        self.refresh_tokens.insert(
            fingerprint(&refresh.jti),
            RefreshEntry { user_id: user.id, expires_at: refresh.exp },
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_ttl_secs,
        })
    }

    /// Check signature, issuer, expiry and kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
                _ => IdentityError::InvalidToken,
            }
        })?;

        if data.claims.kind != expected {
            return Err(IdentityError::InvalidToken);
        }
        Ok(data.claims)
    }

    /// Consume a verified refresh token. Second use of the same token fails.
    pub fn consume_refresh(&self, claims: &Claims) -> Result<(), IdentityError> {
        let now = Utc::now().timestamp();
        match self.refresh_tokens.remove(&fingerprint(&claims.jti)) {
            Some((_, entry)) if entry.user_id == claims.sub && entry.expires_at > now => Ok(()),
            Some(_) => Err(IdentityError::InvalidToken),
            None => {
                tracing::warn!(user_id = %claims.sub, "refresh token reuse or revoked token");
                Err(IdentityError::InvalidToken)
            }
        }
    }

    /// Drop every outstanding refresh token of `user_id`
    pub fn revoke_all(&self, user_id: UserId) -> usize {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|_, entry| entry.user_id != user_id);
        before - self.refresh_tokens.len()
    }

    /// Remove expired refresh entries
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|_, entry| entry.expires_at > now);
        before - self.refresh_tokens.len()
    }

    /// Outstanding refresh tokens
    pub fn active_refresh_tokens(&self) -> usize {
        self.refresh_tokens.len()
    }

    fn claims_for(&self, user: &User, kind: TokenKind, ttl_secs: u64) -> Result<Claims, IdentityError> {
        let now = Utc::now();
        let exp = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| IdentityError::Crypto(format!("token lifetime of {ttl_secs}s is out of range")))?;
        Ok(Claims {
            sub: user.id,
            tenant_id: user.tenant_id,
            roles: user.roles.clone(),
            email: user.email.as_str().to_string(),
            kind,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, IdentityError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| IdentityError::Crypto(e.to_string()))
    }
}

fn fingerprint(jti: &str) -> String {
    hex::encode(Sha256::digest(jti.as_bytes()))
}
