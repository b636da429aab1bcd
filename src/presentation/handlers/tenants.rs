use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ErrorKind, ResponseEnvelope, build_error_response, build_response, error_response};
use crate::domain::TenantId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TenantResponse {
    pub tenant_id: String,
    pub tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct QuotaQuery {
    pub amount: u64,
}

#[derive(Serialize)]
pub struct QuotaCheckResponse {
    pub tenant_id: String,
    pub amount: u64,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    pub amount: u64,
}

#[derive(Serialize)]
pub struct SpendResponse {
    pub tenant_id: String,
    pub remaining_tokens: u64,
}

#[tracing::instrument(skip(state))]
pub async fn get_tenant_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ResponseEnvelope {
    let tenant_id = match TenantId::new(tenant_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e, state.error_status),
    };

    match state.quota_service.get_tenant(&tenant_id).await {
        Ok(record) => build_response(
            &TenantResponse {
                tenant_id: record.tenant_id.to_string(),
                tokens: record.tokens,
            },
            StatusCode::OK,
        ),
        Err(e) => {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "Tenant lookup failed");
            error_response(&e, state.error_status)
        }
    }
}

#[tracing::instrument(skip(state, query))]
pub async fn check_quota_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    query: Result<Query<QuotaQuery>, QueryRejection>,
) -> ResponseEnvelope {
    let Query(QuotaQuery { amount }) = match query {
        Ok(query) => query,
        Err(e) => {
            return build_error_response(e.body_text(), ErrorKind::BadRequest, state.error_status);
        }
    };
    let tenant_id = match TenantId::new(tenant_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e, state.error_status),
    };

    match state.quota_service.check(&tenant_id, amount).await {
        Ok(available) => build_response(
            &QuotaCheckResponse {
                tenant_id: tenant_id.to_string(),
                amount,
                available,
            },
            StatusCode::OK,
        ),
        Err(e) => error_response(&e, state.error_status),
    }
}

#[tracing::instrument(skip(state, payload))]
pub async fn spend_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<SpendRequest>, JsonRejection>,
) -> ResponseEnvelope {
    let Json(SpendRequest { amount }) = match payload {
        Ok(body) => body,
        Err(e) => {
            return build_error_response(e.body_text(), ErrorKind::BadRequest, state.error_status);
        }
    };
    let tenant_id = match TenantId::new(tenant_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e, state.error_status),
    };

    match state.quota_service.spend(&tenant_id, amount).await {
        Ok(remaining_tokens) => build_response(
            &SpendResponse {
                tenant_id: tenant_id.to_string(),
                remaining_tokens,
            },
            StatusCode::OK,
        ),
        Err(e) => {
            tracing::warn!(tenant_id = %tenant_id, amount, error = %e, "Spend rejected");
            error_response(&e, state.error_status)
        }
    }
}
