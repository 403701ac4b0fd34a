//! HTTP error mapping
//!
//! Every crate error becomes a status code plus a stable upper-case code in
//! the standard envelope.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use shop_commerce::CommerceError;
use shop_common::RepositoryError;
use shop_identity::IdentityError;
use shop_notify::NotifyError;
use shop_tenant::TenantError;
use thiserror::Error;

use crate::models::ApiResponse;

/// Handler result
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Errors returned by handlers and middleware
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("too many attempts, retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Status and error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Tenant(e) => match e {
                TenantError::MissingHeader => (StatusCode::BAD_REQUEST, "TENANT_REQUIRED"),
                TenantError::NotFound(_) => (StatusCode::NOT_FOUND, "TENANT_NOT_FOUND"),
                TenantError::Inactive => (StatusCode::FORBIDDEN, "TENANT_INACTIVE"),
                TenantError::Invalid(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                TenantError::Duplicate(_) => (StatusCode::CONFLICT, "CONFLICT"),
                TenantError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::Identity(e) => match e {
                IdentityError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                IdentityError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
                IdentityError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
                IdentityError::TenantMismatch => (StatusCode::FORBIDDEN, "TENANT_MISMATCH"),
                IdentityError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                IdentityError::UserInactive => (StatusCode::UNAUTHORIZED, "USER_INACTIVE"),
                IdentityError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
                IdentityError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                IdentityError::Crypto(_) | IdentityError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            Self::Commerce(e) => match e {
                CommerceError::NotFound(_) | CommerceError::Repository(RepositoryError::NotFound) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                CommerceError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CommerceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CommerceError::InsufficientStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
                CommerceError::ProductUnavailable(_) => (StatusCode::CONFLICT, "PRODUCT_UNAVAILABLE"),
                CommerceError::EmptyCart => (StatusCode::BAD_REQUEST, "EMPTY_CART"),
                CommerceError::PromoRejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PROMO_REJECTED"),
                CommerceError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
                CommerceError::PaymentDeclined(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_DECLINED"),
                CommerceError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::Notify(e) => match e {
                NotifyError::QueueFull | NotifyError::QueueClosed => {
                    (StatusCode::SERVICE_UNAVAILABLE, "NOTIFICATIONS_UNAVAILABLE")
                }
                NotifyError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
                NotifyError::InvalidTemplate(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            },
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::TooManyRequests { .. } => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage and crypto details stay in the log
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, code, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ApiResponse::<()>::error(code, &message))).into_response();
        if let Self::TooManyRequests { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
