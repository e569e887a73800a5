//! # Currency API
//!
//! - **GET `/v1/currencies`**, **GET `/v1/currencies/:code`**: read
//! - **POST `/v1/currencies`**, **PUT `/v1/currencies/:code`**: write
//!   (`manage_currencies`)
//!
//! Rates are decimal strings relative to the base currency, e.g.
//! `{"code": "USD", "name": "US Dollar", "rate_to_base": "15500"}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_core::Currency;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::services::reference::CurrencyPatch;
use crate::state::AppState;

impl Validate for CurrencyPatch {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.rate_to_base.is_none() {
            return Err("at least one of name, rate_to_base must be given".to_string());
        }
        Ok(())
    }
}

/// Construct the currency router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/currencies", get(list_currencies).post(add_currency))
        .route(
            "/v1/currencies/:code",
            get(get_currency).put(update_currency),
        )
}

/// GET /v1/currencies: every currency.
#[utoipa::path(
    get,
    path = "/v1/currencies",
    responses((status = 200, description = "All currencies", body = Vec<Currency>)),
    tag = "currencies"
)]
async fn list_currencies(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Currency>>, AppError> {
    Ok(Json(state.reference.list_currencies(caller.user_id).await?))
}

/// GET /v1/currencies/:code: one currency.
#[utoipa::path(
    get,
    path = "/v1/currencies/{code}",
    params(("code" = String, Path, description = "Three-letter currency code")),
    responses(
        (status = 200, description = "The currency", body = Currency),
        (status = 404, description = "No such currency", body = crate::error::ErrorBody),
    ),
    tag = "currencies"
)]
async fn get_currency(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
) -> Result<Json<Currency>, AppError> {
    Ok(Json(state.reference.get_currency(caller.user_id, &code).await?))
}

/// POST /v1/currencies: introduce a currency.
#[utoipa::path(
    post,
    path = "/v1/currencies",
    request_body = Currency,
    responses(
        (status = 201, description = "Currency added", body = Currency),
        (status = 409, description = "Code already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Short name or non-positive rate", body = crate::error::ErrorBody),
    ),
    tag = "currencies"
)]
async fn add_currency(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<Currency>, JsonRejection>,
) -> Result<(StatusCode, Json<Currency>), AppError> {
    let req = extract_json(body)?;
    let currency = state.reference.add_currency(caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(currency)))
}

/// PUT /v1/currencies/:code: edit name or rate. Blank fields are kept.
#[utoipa::path(
    put,
    path = "/v1/currencies/{code}",
    params(("code" = String, Path, description = "Three-letter currency code")),
    request_body = CurrencyPatch,
    responses(
        (status = 200, description = "Updated currency", body = Currency),
        (status = 404, description = "No such currency", body = crate::error::ErrorBody),
    ),
    tag = "currencies"
)]
async fn update_currency(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(code): Path<String>,
    body: Result<Json<CurrencyPatch>, JsonRejection>,
) -> Result<Json<Currency>, AppError> {
    let patch = extract_validated_json(body)?;
    Ok(Json(
        state
            .reference
            .update_currency(caller.user_id, &code, patch)
            .await?,
    ))
}
