//! # Account Type API
//!
//! - **GET `/v1/account-types`**, **GET `/v1/account-types/:id`**: read
//! - **POST `/v1/account-types`**, **PUT `/v1/account-types/:id`**: write
//!   (`manage_account_types`)

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_core::{AccountType, AccountTypeId, NewAccountType};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::services::reference::AccountTypePatch;
use crate::state::AppState;

impl Validate for AccountTypePatch {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none()
            && self.can_etoll.is_none()
            && self.can_indomart.is_none()
            && self.can_steam.is_none()
        {
            return Err("no fields to update".to_string());
        }
        Ok(())
    }
}

/// Construct the account type router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/account-types",
            get(list_account_types).post(add_account_type),
        )
        .route(
            "/v1/account-types/:id",
            get(get_account_type).put(update_account_type),
        )
}

/// GET /v1/account-types: every account type.
#[utoipa::path(
    get,
    path = "/v1/account-types",
    responses((status = 200, description = "All account types", body = Vec<AccountType>)),
    tag = "account-types"
)]
async fn list_account_types(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<AccountType>>, AppError> {
    Ok(Json(state.reference.list_account_types(caller.user_id).await?))
}

/// GET /v1/account-types/:id: one account type.
#[utoipa::path(
    get,
    path = "/v1/account-types/{id}",
    params(("id" = i32, Path, description = "Account type id")),
    responses(
        (status = 200, description = "The account type", body = AccountType),
        (status = 404, description = "No such account type", body = crate::error::ErrorBody),
    ),
    tag = "account-types"
)]
async fn get_account_type(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<AccountType>, AppError> {
    let id = AccountTypeId::new(extract_path(path)?);
    Ok(Json(state.reference.get_account_type(caller.user_id, id).await?))
}

/// POST /v1/account-types: introduce an account type.
#[utoipa::path(
    post,
    path = "/v1/account-types",
    request_body = NewAccountType,
    responses(
        (status = 201, description = "Account type added", body = AccountType),
        (status = 403, description = "Caller may not manage account types", body = crate::error::ErrorBody),
    ),
    tag = "account-types"
)]
async fn add_account_type(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<NewAccountType>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountType>), AppError> {
    let req = extract_json(body)?;
    let account_type = state.reference.add_account_type(caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(account_type)))
}

/// PUT /v1/account-types/:id: edit an account type.
#[utoipa::path(
    put,
    path = "/v1/account-types/{id}",
    params(("id" = i32, Path, description = "Account type id")),
    request_body = AccountTypePatch,
    responses(
        (status = 200, description = "Updated account type", body = AccountType),
        (status = 404, description = "No such account type", body = crate::error::ErrorBody),
    ),
    tag = "account-types"
)]
async fn update_account_type(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<AccountTypePatch>, JsonRejection>,
) -> Result<Json<AccountType>, AppError> {
    let id = AccountTypeId::new(extract_path(path)?);
    let patch = extract_validated_json(body)?;
    Ok(Json(
        state
            .reference
            .update_account_type(caller.user_id, id, patch)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_rejected() {
        assert!(AccountTypePatch::default().validate().is_err());
        let patch = AccountTypePatch {
            can_steam: Some(false),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
}
