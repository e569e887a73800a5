//! # Integration Tests for backoffice-api
//!
//! Drives the assembled router over HTTP: health probes, authentication,
//! account opening and numbering, capability checks, reference data CRUD,
//! concurrent provisioning, and OpenAPI generation.

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use backoffice_api::bootstrap::{seed_admin, AdminSeed};
use backoffice_api::middleware::rate_limit::RateLimitConfig;
use backoffice_api::state::{AppConfig, AppState};
use backoffice_api::store::MemoryStore;
use backoffice_core::SecretHasher;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use zeroize::Zeroizing;

const ADMIN_NIK: &str = "3171000000000001";
const CLERK_NIK: &str = "3171000000000002";
const CUSTOMER_NIK: &str = "3171000000000003";

/// A running app plus the bearer tokens of its seeded users.
struct Harness {
    app: axum::Router,
    admin: String,
    clerk: String,
    customer: String,
}

fn cheap_state(config: AppConfig) -> AppState {
    let store = Arc::new(MemoryStore::seeded());
    AppState::with_stores(
        config,
        store.clone(),
        store,
        SecretHasher::with_cost(1024, 1, 1).unwrap(),
    )
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(request(method, uri, token, body))
        .await
        .unwrap()
}

fn user_body(nik: &str, username: &str, role: &str) -> Value {
    json!({
        "nik": nik,
        "role_id": role,
        "full_name": format!("{username} Santoso"),
        "username": username,
        "email": format!("{username}@bank.test"),
        "phone": "+62 812 0000 0000",
        "password": "correct horse",
    })
}

/// Build the app over a fresh store: an administrator, a clerk (EMP), a
/// customer (USR), one branch and one account type.
async fn harness_with(config: AppConfig) -> Harness {
    let state = cheap_state(config);
    let admin = seed_admin(
        &state,
        AdminSeed {
            nik: ADMIN_NIK.into(),
            username: "admin".into(),
            email: "admin@bank.test".into(),
            password: Zeroizing::new("bootstrap-pass".into()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    let app = backoffice_api::app(state);
    let admin = admin.id.to_string();

    let mut ids = Vec::new();
    for (nik, username, role) in [(CLERK_NIK, "clerk", "EMP"), (CUSTOMER_NIK, "customer", "USR")] {
        let response = send(
            &app,
            "POST",
            "/v1/users",
            Some(&admin),
            Some(user_body(nik, username, role)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user = body_json(response).await;
        ids.push(user["id"].as_str().unwrap().to_string());
    }

    let response = send(
        &app,
        "POST",
        "/v1/branches",
        Some(&admin),
        Some(json!({"name": "Jakarta Pusat", "address": "Jl. Thamrin 1"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = send(
        &app,
        "POST",
        "/v1/account-types",
        Some(&admin),
        Some(json!({"name": "Tabungan", "can_etoll": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let customer = ids.pop().unwrap();
    let clerk = ids.pop().unwrap();
    Harness {
        app,
        admin,
        clerk,
        customer,
    }
}

async fn harness() -> Harness {
    harness_with(AppConfig::default()).await
}

fn open_uri(nik: &str) -> String {
    format!("/v1/accounts/1/1/{nik}")
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/health/liveness", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/health/readiness", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_missing_token_is_401() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/v1/branches", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_configured_secret_is_enforced() {
    let config = AppConfig {
        auth_token: Some(backoffice_api::auth::SecretToken::new("s3cret")),
        ..AppConfig::default()
    };
    let state = cheap_state(config);
    let admin = seed_admin(
        &state,
        AdminSeed {
            nik: ADMIN_NIK.into(),
            username: "admin".into(),
            email: "admin@bank.test".into(),
            password: Zeroizing::new("bootstrap-pass".into()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    let app = backoffice_api::app(state);

    let bare = admin.id.to_string();
    let response = send(&app, "GET", "/v1/branches", Some(&bare), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = format!("{}:nope", admin.id);
    let response = send(&app, "GET", "/v1/branches", Some(&wrong), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let good = format!("{}:s3cret", admin.id);
    let response = send(&app, "GET", "/v1/branches", Some(&good), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/v1/nothing-here", Some(&h.admin), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// -- Account Provisioning -----------------------------------------------------

#[tokio::test]
async fn test_first_account_gets_sequence_one() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.clerk),
        Some(json!({"pin": "123456"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let account = body_json(response).await;
    assert_eq!(account["account_number"], "00010001000000000001");
    assert_eq!(account["sequence_number"], 1);
    assert_eq!(account["currency"], "IDR");
    assert_eq!(account["balance"], "0");
    assert_eq!(account["user_id"], h.customer.as_str());
    assert_eq!(account["employee_id"], h.clerk.as_str());
    assert!(account.get("pin_hash").is_none());
}

#[tokio::test]
async fn test_sequences_are_per_branch_and_type() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        "/v1/account-types",
        Some(&h.admin),
        Some(json!({"name": "Giro"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut numbers = Vec::new();
    for uri in [
        "/v1/accounts/1/1/3171000000000003",
        "/v1/accounts/1/1/3171000000000003",
        "/v1/accounts/1/2/3171000000000003",
    ] {
        let response = send(
            &h.app,
            "POST",
            uri,
            Some(&h.clerk),
            Some(json!({"pin": "654321"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        numbers.push(body_json(response).await["account_number"].clone());
    }
    assert_eq!(numbers[0], "00010001000000000001");
    assert_eq!(numbers[1], "00010001000000000002");
    assert_eq!(numbers[2], "00010002000000000001");
}

#[tokio::test]
async fn test_customer_cannot_open_accounts() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.customer),
        Some(json!({"pin": "123456"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_bad_pin_from_unauthorized_caller_is_still_403() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.customer),
        Some(json!({"pin": "12"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_pin_is_422_and_consumes_nothing() {
    let h = harness().await;
    for pin in ["12345", "1234567", "12a456"] {
        let response = send(
            &h.app,
            "POST",
            &open_uri(CUSTOMER_NIK),
            Some(&h.clerk),
            Some(json!({"pin": pin})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "pin {pin}");
    }
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.clerk),
        Some(json!({"pin": "000000"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await["account_number"],
        "00010001000000000001"
    );
}

#[tokio::test]
async fn test_unknown_references_are_404() {
    let h = harness().await;
    let cases = [
        "/v1/accounts/1/1/9999000000000000".to_string(),
        "/v1/accounts/9/1/3171000000000003".to_string(),
        "/v1/accounts/1/9/3171000000000003".to_string(),
    ];
    for uri in &cases {
        let response = send(
            &h.app,
            "POST",
            uri,
            Some(&h.clerk),
            Some(json!({"pin": "123456"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.clerk),
        Some(json!({"pin": "123456", "currency": "USD"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_path_is_400() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        "/v1/accounts/one/1/3171000000000003",
        Some(&h.clerk),
        Some(json!({"pin": "123456"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_reads_and_updates_own_account() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.clerk),
        Some(json!({"pin": "123456"})),
    )
    .await;
    let number = body_json(response).await["account_number"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(&h.app, "GET", "/v1/me/accounts", Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mine = body_json(response).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let uri = format!("/v1/accounts/{number}");
    let response = send(&h.app, "GET", &uri, Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &h.app,
        "PUT",
        &uri,
        Some(&h.customer),
        Some(json!({"pin": "999999"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["account_number"], number.as_str());

    // Only staff may list every account.
    let response = send(&h.app, "GET", "/v1/accounts", Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(&h.app, "GET", "/v1/accounts", Some(&h.clerk), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_distinct_contiguous_numbers() {
    let h = harness().await;
    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = h.app.clone();
        let clerk = h.clerk.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(request(
                    "POST",
                    &open_uri(CUSTOMER_NIK),
                    Some(&clerk),
                    Some(json!({"pin": "123456"})),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            body_json(response).await["sequence_number"].as_u64().unwrap()
        }));
    }

    let mut sequences = HashSet::new();
    for handle in handles {
        sequences.insert(handle.await.unwrap());
    }
    let expected: HashSet<u64> = (1..=50).collect();
    assert_eq!(sequences, expected);
}

// -- Users --------------------------------------------------------------------

#[tokio::test]
async fn test_duplicate_nik_is_409() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        "/v1/users",
        Some(&h.admin),
        Some(user_body(CUSTOMER_NIK, "another", "USR")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_search_and_lookup() {
    let h = harness().await;
    let response = send(
        &h.app,
        "GET",
        "/v1/users/search?username=customer",
        Some(&h.admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let found = body_json(response).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["nik"], CUSTOMER_NIK);
    assert!(found[0].get("password_hash").is_none());

    let response = send(&h.app, "GET", "/v1/users/search", Some(&h.admin), None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let uri = format!("/v1/users/{CUSTOMER_NIK}");
    let response = send(&h.app, "GET", &uri, Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let uri = format!("/v1/users/{CLERK_NIK}");
    let response = send(&h.app, "GET", &uri, Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// -- Reference Data -----------------------------------------------------------

#[tokio::test]
async fn test_branch_update_keeps_blank_fields() {
    let h = harness().await;
    let response = send(
        &h.app,
        "PUT",
        "/v1/branches/1",
        Some(&h.admin),
        Some(json!({"name": "Jakarta Selatan", "address": ""})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let branch = body_json(response).await;
    assert_eq!(branch["name"], "Jakarta Selatan");
    assert_eq!(branch["address"], "Jl. Thamrin 1");

    let response = send(&h.app, "PUT", "/v1/branches/1", Some(&h.admin), Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(
        &h.app,
        "PUT",
        "/v1/branches/1",
        Some(&h.clerk),
        Some(json!({"name": "Nope"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_currency_lifecycle() {
    let h = harness().await;
    let response = send(
        &h.app,
        "POST",
        "/v1/currencies",
        Some(&h.admin),
        Some(json!({"code": "USD", "name": "US Dollar", "rate_to_base": "15500"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &h.app,
        "POST",
        "/v1/currencies",
        Some(&h.admin),
        Some(json!({"code": "USD", "name": "US Dollar", "rate_to_base": "15500"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &h.app,
        "PUT",
        "/v1/currencies/USD",
        Some(&h.admin),
        Some(json!({"rate_to_base": "16000.5"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let usd = body_json(response).await;
    assert_eq!(usd["rate_to_base"], "16000.5");
    assert_eq!(usd["name"], "US Dollar");

    let response = send(&h.app, "GET", "/v1/currencies", Some(&h.customer), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    // Accounts can now be opened in USD.
    let response = send(
        &h.app,
        "POST",
        &open_uri(CUSTOMER_NIK),
        Some(&h.clerk),
        Some(json!({"pin": "123456", "currency": "USD"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["currency"], "USD");
}

#[tokio::test]
async fn test_fee_crud() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/v1/transaction-fees", Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = send(
        &h.app,
        "POST",
        "/v1/transaction-fees",
        Some(&h.admin),
        Some(json!({"code": "RTG", "name": "RTGS Transfer", "fee": "25000"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &h.app,
        "PUT",
        "/v1/transaction-fees/RTG",
        Some(&h.admin),
        Some(json!({"fee": "30000"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["fee"], "30000");

    let response = send(
        &h.app,
        "DELETE",
        "/v1/transaction-fees/RTG",
        Some(&h.clerk),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &h.app,
        "DELETE",
        "/v1/transaction-fees/RTG",
        Some(&h.admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &h.app,
        "GET",
        "/v1/transaction-fees/RTG",
        Some(&h.admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Rate Limiting ------------------------------------------------------------

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let config = AppConfig {
        rate_limit: RateLimitConfig {
            max_requests: 40,
            window_secs: 60,
        },
        ..AppConfig::default()
    };
    let h = harness_with(config).await;
    let mut last = StatusCode::OK;
    for _ in 0..=40 {
        last = send(&h.app, "GET", "/v1/branches", Some(&h.customer), None)
            .await
            .status();
        if last == StatusCode::TOO_MANY_REQUESTS {
            break;
        }
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);

    // Other callers keep their own budget.
    let response = send(&h.app, "GET", "/v1/branches", Some(&h.clerk), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_json_is_served() {
    let h = harness().await;
    let response = send(&h.app, "GET", "/openapi.json", Some(&h.customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/v1/accounts/{branch}/{account_type}/{nik}"]["post"].is_object());
}

// -- PostgreSQL ---------------------------------------------------------------

/// Requires a scratch database in `TEST_DATABASE_URL`.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_postgres_concurrent_creates() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL");
    let pool = backoffice_api::db::init_pool(&url, 10).await.unwrap();
    let store = Arc::new(backoffice_api::db::PgStore::new(pool));
    let state = AppState::with_stores(
        AppConfig::default(),
        store.clone(),
        store,
        SecretHasher::with_cost(1024, 1, 1).unwrap(),
    );
    let suffix = uuid::Uuid::new_v4().as_u128() % 1_000_000_000_000;
    let admin_nik = format!("9{suffix:015}");
    let admin = seed_admin(
        &state,
        AdminSeed {
            nik: admin_nik.clone(),
            username: format!("admin{suffix}"),
            email: format!("admin{suffix}@bank.test"),
            password: Zeroizing::new("bootstrap-pass".into()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    let app = backoffice_api::app(state);
    let admin = admin.id.to_string();

    let response = send(
        &app,
        "POST",
        "/v1/branches",
        Some(&admin),
        Some(json!({"name": format!("Test {suffix}"), "address": "Scratch"})),
    )
    .await;
    let branch = body_json(response).await["id"].as_i64().unwrap();
    let response = send(
        &app,
        "POST",
        "/v1/account-types",
        Some(&admin),
        Some(json!({"name": format!("Type {suffix}")})),
    )
    .await;
    let account_type = body_json(response).await["id"].as_i64().unwrap();

    let uri = format!("/v1/accounts/{branch}/{account_type}/{admin_nik}");
    let mut handles = Vec::new();
    for _ in 0..20 {
        let app = app.clone();
        let admin = admin.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(request("POST", &uri, Some(&admin), Some(json!({"pin": "123456"}))))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            body_json(response).await["sequence_number"].as_u64().unwrap()
        }));
    }
    let mut sequences = HashSet::new();
    for handle in handles {
        sequences.insert(handle.await.unwrap());
    }
    assert_eq!(sequences, (1..=20).collect::<HashSet<u64>>());
}
