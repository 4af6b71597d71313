//! HTTP handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::AppState;
use super::types::{ApiError, ApiResult};
use crate::transfer::{Sender, TransferReceipt, TransferRecord, TransferRequest};
use crate::user_auth::AuthenticatedUser;

/// POST /transfer
///
/// 201 with `{message, transfer}` on success.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransferReceipt>)> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(user_id = %user.user_id, error = %rejection, "Unreadable transfer body");
        ApiError::bad_request(rejection.body_text())
    })?;

    let receipt = state
        .coordinator
        .submit(&Sender::from(&user), request)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /transfer
///
/// Caller's transfers, newest first.
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<TransferRecord>>> {
    let records = state
        .coordinator
        .list_transfers(&Sender::from(&user))
        .await?;
    Ok(Json(records))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub bank: String,
    pub bank_prefix: String,
    pub registry_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_refreshed_at: Option<DateTime<Utc>>,
    pub registry_refreshing: bool,
    pub database: &'static str,
}

/// GET /health
///
/// 503 only when a configured database does not answer.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.pg_db {
        Some(db) => match db.health_check().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::error!(error = %e, "PostgreSQL health check failed");
                "unavailable"
            }
        },
        None => "disabled",
    };

    let coordinator = &state.coordinator;
    let snapshot = coordinator.registry().snapshot();
    let healthy = database != "unavailable";

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            bank: state.bank_name.clone(),
            bank_prefix: coordinator.local_prefix().to_string(),
            registry_size: snapshot.len(),
            registry_refreshed_at: snapshot.refreshed_at(),
            registry_refreshing: coordinator.refresher().is_refreshing(),
            database,
        }),
    )
}
