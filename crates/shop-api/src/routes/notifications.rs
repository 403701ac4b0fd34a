//! Notification templates and delivery log (admin)

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shop_notify::{Channel, DeliveryRecord, NotificationKind, Template, TemplateEntry};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::{RoleGuard, Tenant};
use crate::models::ApiResponse;
use crate::AppState;

const MAX_DELIVERIES: usize = 500;

pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    super::restricted(
        Router::new()
            .route("/deliveries", get(list_deliveries))
            .route("/templates", get(list_templates).put(upsert_template))
            .route("/templates/:kind/:channel", delete(reset_template)),
        state,
        RoleGuard::admin(),
    )
}

#[derive(Debug, Deserialize)]
pub struct DeliveryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateOverride {
    pub kind: NotificationKind,
    pub channel: Channel,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateReset {
    pub kind: NotificationKind,
    pub channel: Channel,
    pub removed: bool,
}

async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<DeliveryParams>,
) -> ApiResult<Vec<DeliveryRecord>> {
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_DELIVERIES);
    Ok(Json(ApiResponse::success(state.notifier.deliveries(ctx.tenant_id(), limit))))
}

async fn list_templates(State(state): State<Arc<AppState>>, Tenant(ctx): Tenant) -> ApiResult<Vec<TemplateEntry>> {
    Ok(Json(ApiResponse::success(state.notifier.templates().list(ctx.tenant_id()))))
}

async fn upsert_template(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(body): Json<TemplateOverride>,
) -> ApiResult<TemplateEntry> {
    let template = state.notifier.templates().upsert(
        ctx.tenant_id(),
        body.kind,
        body.channel,
        Template { subject: body.subject, body: body.body },
    )?;
    Ok(Json(ApiResponse::success(TemplateEntry {
        kind: body.kind,
        channel: body.channel,
        template,
        overridden: true,
    })))
}

async fn reset_template(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path((kind, channel)): Path<(NotificationKind, Channel)>,
) -> ApiResult<TemplateReset> {
    let removed = state.notifier.templates().remove(ctx.tenant_id(), kind, channel);
    Ok(Json(ApiResponse::success(TemplateReset { kind, channel, removed })))
}
