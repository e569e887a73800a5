//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the back-office API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bank Back-Office API",
        version = "0.1.0",
        description = "Account provisioning with per-branch sequential account numbers, user management and reference data."
    ),
    paths(
        // Accounts
        crate::routes::accounts::create_account,
        crate::routes::accounts::list_accounts,
        crate::routes::accounts::my_accounts,
        crate::routes::accounts::get_account,
        crate::routes::accounts::update_account,
        // Users
        crate::routes::users::add_user,
        crate::routes::users::search_users,
        crate::routes::users::get_user,
        // Branches
        crate::routes::branches::list_branches,
        crate::routes::branches::get_branch,
        crate::routes::branches::add_branch,
        crate::routes::branches::update_branch,
        // Account types
        crate::routes::account_types::list_account_types,
        crate::routes::account_types::get_account_type,
        crate::routes::account_types::add_account_type,
        crate::routes::account_types::update_account_type,
        // Currencies
        crate::routes::currencies::list_currencies,
        crate::routes::currencies::get_currency,
        crate::routes::currencies::add_currency,
        crate::routes::currencies::update_currency,
        // Transaction fees
        crate::routes::fees::list_fees,
        crate::routes::fees::get_fee,
        crate::routes::fees::add_fee,
        crate::routes::fees::update_fee,
        crate::routes::fees::delete_fee,
    ),
    components(schemas(
        // Records
        backoffice_core::Account,
        backoffice_core::AccountNumber,
        backoffice_core::User,
        backoffice_core::Role,
        backoffice_core::Branch,
        backoffice_core::NewBranch,
        backoffice_core::AccountType,
        backoffice_core::NewAccountType,
        backoffice_core::Currency,
        backoffice_core::TransactionFee,
        backoffice_core::Capability,
        backoffice_core::CapabilitySet,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Request DTOs
        crate::routes::accounts::CreateAccountRequest,
        crate::routes::accounts::UpdateAccountRequest,
        crate::services::NewUser,
        crate::services::reference::BranchPatch,
        crate::services::reference::AccountTypePatch,
        crate::services::reference::CurrencyPatch,
        crate::services::reference::FeePatch,
    )),
    tags(
        (name = "accounts", description = "Account provisioning"),
        (name = "users", description = "User registration and lookup"),
        (name = "branches", description = "Branch reference data"),
        (name = "account-types", description = "Account type reference data"),
        (name = "currencies", description = "Currencies and base-currency rates"),
        (name = "transaction-fees", description = "Transaction fee schedule"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
