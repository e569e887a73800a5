//! # User API
//!
//! - **POST `/v1/users`**: register a user
//! - **GET `/v1/users`**, **GET `/v1/users/search`**: find users by NIK,
//!   username or e-mail
//! - **GET `/v1/users/:nik`**: one user

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_core::User;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::services::NewUser;
use crate::state::AppState;
use crate::store::UserQuery;

/// Search criteria. A user matches when any given field matches exactly.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchParams {
    /// National identity number.
    pub nik: Option<String>,
    /// Login name.
    pub username: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
}

impl From<UserSearchParams> for UserQuery {
    fn from(params: UserSearchParams) -> Self {
        let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        UserQuery {
            nik: keep(params.nik),
            username: keep(params.username),
            email: keep(params.email),
        }
    }
}

/// Construct the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(search_users).post(add_user))
        .route("/v1/users/search", get(search_users))
        .route("/v1/users/:nik", get(get_user))
}

/// POST /v1/users: register a user.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 403, description = "Caller may not manage users", body = crate::error::ErrorBody),
        (status = 409, description = "NIK, username or e-mail already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid field", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn add_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let req = extract_json(body)?;
    let user = state.reference.add_user(caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users/search: users matching any criterion.
#[utoipa::path(
    get,
    path = "/v1/users/search",
    params(UserSearchParams),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 422, description = "No criteria given", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn search_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<UserSearchParams>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .reference
        .search_users(caller.user_id, params.into())
        .await?;
    Ok(Json(users))
}

/// GET /v1/users/:nik: one user.
#[utoipa::path(
    get,
    path = "/v1/users/{nik}",
    params(("nik" = String, Path, description = "National identity number")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 404, description = "No such user", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
async fn get_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(nik): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.reference.get_user_by_nik(caller.user_id, &nik).await?))
}
