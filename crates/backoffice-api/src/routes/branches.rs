//! # Branch API
//!
//! - **GET `/v1/branches`**, **GET `/v1/branches/:id`**: read (any caller)
//! - **POST `/v1/branches`**, **PUT `/v1/branches/:id`**: write
//!   (`manage_branches`)

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_core::{Branch, BranchId, NewBranch};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::services::reference::BranchPatch;
use crate::state::AppState;

impl Validate for BranchPatch {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.address.is_none() {
            return Err("at least one of name, address must be given".to_string());
        }
        Ok(())
    }
}

/// Construct the branch router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/branches", get(list_branches).post(add_branch))
        .route("/v1/branches/:id", get(get_branch).put(update_branch))
}

/// GET /v1/branches: every branch.
#[utoipa::path(
    get,
    path = "/v1/branches",
    responses((status = 200, description = "All branches", body = Vec<Branch>)),
    tag = "branches"
)]
async fn list_branches(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(state.reference.list_branches(caller.user_id).await?))
}

/// GET /v1/branches/:id: one branch.
#[utoipa::path(
    get,
    path = "/v1/branches/{id}",
    params(("id" = i32, Path, description = "Branch id")),
    responses(
        (status = 200, description = "The branch", body = Branch),
        (status = 404, description = "No such branch", body = crate::error::ErrorBody),
    ),
    tag = "branches"
)]
async fn get_branch(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Branch>, AppError> {
    let id = BranchId::new(extract_path(path)?);
    Ok(Json(state.reference.get_branch(caller.user_id, id).await?))
}

/// POST /v1/branches: open a branch.
#[utoipa::path(
    post,
    path = "/v1/branches",
    request_body = NewBranch,
    responses(
        (status = 201, description = "Branch added", body = Branch),
        (status = 403, description = "Caller may not manage branches", body = crate::error::ErrorBody),
        (status = 422, description = "Empty name or address", body = crate::error::ErrorBody),
    ),
    tag = "branches"
)]
async fn add_branch(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<NewBranch>, JsonRejection>,
) -> Result<(StatusCode, Json<Branch>), AppError> {
    let req = extract_json(body)?;
    let branch = state.reference.add_branch(caller.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// PUT /v1/branches/:id: edit a branch. Absent or blank fields are kept.
#[utoipa::path(
    put,
    path = "/v1/branches/{id}",
    params(("id" = i32, Path, description = "Branch id")),
    request_body = BranchPatch,
    responses(
        (status = 200, description = "Updated branch", body = Branch),
        (status = 404, description = "No such branch", body = crate::error::ErrorBody),
    ),
    tag = "branches"
)]
async fn update_branch(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<BranchPatch>, JsonRejection>,
) -> Result<Json<Branch>, AppError> {
    let id = BranchId::new(extract_path(path)?);
    let patch = extract_validated_json(body)?;
    Ok(Json(
        state.reference.update_branch(caller.user_id, id, patch).await?,
    ))
}
