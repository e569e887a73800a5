//! # Account API
//!
//! - **POST `/v1/accounts/:branch/:account_type/:nik`**: open an account
//! - **GET `/v1/accounts`**: list every account (staff)
//! - **GET `/v1/accounts/:number`**: one account (staff or owner)
//! - **PUT `/v1/accounts/:number`**: change the PIN (staff or owner)
//! - **GET `/v1/me/accounts`**: the caller's own accounts
//!
//! PINs are accepted in request bodies only and never appear in a response.
//! PIN shape is checked by the service after the authorization and lookup
//! steps, so a bad PIN from an unauthorized caller still yields 403.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use backoffice_core::{Account, AccountTypeId, BranchId};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::services::{CreateAccount, UpdateAccount};
use crate::state::AppState;

/// Body of an account opening request.
#[derive(Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Six-digit PIN.
    #[schema(example = "123456")]
    pub pin: String,
    /// Currency code. The base currency when absent.
    #[schema(example = "IDR")]
    pub currency: Option<String>,
}

impl std::fmt::Debug for CreateAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAccountRequest")
            .field("pin", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

/// Body of an account update.
#[derive(Default, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    /// Replacement six-digit PIN.
    pub pin: Option<String>,
}

impl std::fmt::Debug for UpdateAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateAccountRequest")
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Construct the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts", get(list_accounts))
        .route(
            "/v1/accounts/:branch/:account_type/:nik",
            post(create_account),
        )
        .route("/v1/accounts/:number", get(get_account).put(update_account))
        .route("/v1/me/accounts", get(my_accounts))
}

/// POST /v1/accounts/:branch/:account_type/:nik: open an account.
#[utoipa::path(
    post,
    path = "/v1/accounts/{branch}/{account_type}/{nik}",
    params(
        ("branch" = i32, Path, description = "Branch id"),
        ("account_type" = i32, Path, description = "Account type id"),
        ("nik" = String, Path, description = "Owner's national identity number"),
    ),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account opened", body = Account),
        (status = 403, description = "Caller may not provision accounts", body = crate::error::ErrorBody),
        (status = 404, description = "Owner, branch, account type or currency not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed PIN", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn create_account(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<(i32, i32, String)>, PathRejection>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let (branch, account_type, nik) = extract_path(path)?;
    let req = extract_json(body)?;

    let account = state
        .accounts
        .create_account(CreateAccount {
            requester: caller.user_id,
            branch: BranchId::new(branch),
            account_type: AccountTypeId::new(account_type),
            target_nik: nik,
            pin: req.pin,
            currency: req.currency,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /v1/accounts: every account.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    responses(
        (status = 200, description = "All accounts", body = Vec<Account>),
        (status = 403, description = "Caller may not list accounts", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn list_accounts(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.accounts.list_accounts(caller.user_id).await?))
}

/// GET /v1/me/accounts: the caller's accounts.
#[utoipa::path(
    get,
    path = "/v1/me/accounts",
    responses((status = 200, description = "Caller's accounts", body = Vec<Account>)),
    tag = "accounts"
)]
async fn my_accounts(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.accounts.my_accounts(caller.user_id).await?))
}

/// GET /v1/accounts/:number: one account.
#[utoipa::path(
    get,
    path = "/v1/accounts/{number}",
    params(("number" = String, Path, description = "20-digit account number")),
    responses(
        (status = 200, description = "The account", body = Account),
        (status = 404, description = "No such account", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn get_account(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(number): Path<String>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.accounts.get_account(caller.user_id, &number).await?))
}

/// PUT /v1/accounts/:number: change the PIN.
#[utoipa::path(
    put,
    path = "/v1/accounts/{number}",
    params(("number" = String, Path, description = "20-digit account number")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = Account),
        (status = 404, description = "No such account", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed PIN", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
async fn update_account(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(number): Path<String>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let req = extract_json(body)?;
    let account = state
        .accounts
        .update_account(caller.user_id, &number, UpdateAccount { pin: req.pin })
        .await?;
    Ok(Json(account))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_debug_hides_pin() {
        let req = CreateAccountRequest {
            pin: "123456".into(),
            currency: None,
        };
        assert!(!format!("{req:?}").contains("123456"));
    }
}
