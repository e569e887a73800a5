//! # Transaction Fee API
//!
//! - **GET `/v1/transaction-fees`**, **GET `/v1/transaction-fees/:code`**: read
//! - **POST**, **PUT**, **DELETE**: write (`manage_fees`)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_core::TransactionFee;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::services::reference::FeePatch;
use crate::state::AppState;

impl Validate for FeePatch {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.fee.is_none() {
            return Err("at least one of name, fee must be given".to_string());
        }
        Ok(())
    }
}

/// Construct the transaction fee router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/transaction-fees", get(list_fees).post(add_fee))
        .route(
            "/v1/transaction-fees/:code",
            get(get_fee).put(update_fee).delete(delete_fee),
        )
}

/// GET /v1/transaction-fees: every fee.
#[utoipa::path(
    get,
    path = "/v1/transaction-fees",
    responses((status = 200, description = "All fees", body = Vec<TransactionFee>)),
    tag = "transaction-fees"
)]
async fn list_fees(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<TransactionFee>>, AppError> {
    Ok(Json(state.reference.list_fees(caller.user_id).await?))
}

/// GET /v1/transaction-fees/:code: one fee.
#[utoipa::path(
    get,
    path = "/v1/transaction-fees/{code}",
    params(("code" = String, Path, description = "Three-character fee code")),
    responses(
        (status = 200, description = "The fee", body = TransactionFee),
        (status = 404, description = "No such fee", body = crate::error::ErrorBody),
    ),
    tag = "transaction-fees"
)]
async fn get_fee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
) -> Result<Json<TransactionFee>, AppError> {
    Ok(Json(state.reference.get_fee(caller.user_id, &code).await?))
}

/// POST /v1/transaction-fees: introduce a fee.
#[utoipa::path(
    post,
    path = "/v1/transaction-fees",
    request_body = TransactionFee,
    responses(
        (status = 201, description = "Fee added", body = TransactionFee),
        (status = 409, description = "Code already in use", body = crate::error::ErrorBody),
    ),
    tag = "transaction-fees"
)]
async fn add_fee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<TransactionFee>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionFee>), AppError> {
    let req = extract_json(body)?;
    let fee = state.reference.add_fee(caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(fee)))
}

/// PUT /v1/transaction-fees/:code: edit a fee.
#[utoipa::path(
    put,
    path = "/v1/transaction-fees/{code}",
    params(("code" = String, Path, description = "Three-character fee code")),
    request_body = FeePatch,
    responses(
        (status = 200, description = "Updated fee", body = TransactionFee),
        (status = 404, description = "No such fee", body = crate::error::ErrorBody),
    ),
    tag = "transaction-fees"
)]
async fn update_fee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<FeePatch>, JsonRejection>,
) -> Result<Json<TransactionFee>, AppError> {
    let patch = extract_validated_json(body)?;
    Ok(Json(
        state.reference.update_fee(caller.user_id, &code, patch).await?,
    ))
}

/// DELETE /v1/transaction-fees/:code: remove a fee.
#[utoipa::path(
    delete,
    path = "/v1/transaction-fees/{code}",
    params(("code" = String, Path, description = "Three-character fee code")),
    responses(
        (status = 204, description = "Fee removed"),
        (status = 404, description = "No such fee", body = crate::error::ErrorBody),
    ),
    tag = "transaction-fees"
)]
async fn delete_fee(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.reference.delete_fee(caller.user_id, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}
