//! API Integration Tests
//!
//! End-to-end flows through the router. Requires DATABASE_URL.

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use payflow::api::{self, AppState};

mod common;

fn test_app(pool: PgPool) -> Router {
    api::create_router()
        .layer(middleware::from_fn(api::middleware::identity_middleware))
        .with_state(AppState::new(pool, Duration::from_secs(5)))
}

fn json_request(method: &str, uri: &str, user_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-User-Id", user_id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-User-Id", user_id.to_string())
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_transfer_e2e() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let sender = common::seed_account(&pool, 1000).await;
    let recipient = common::seed_account(&pool, 200).await;

    // Transfer 3.00 from sender to recipient
    let req = json_request(
        "POST",
        "/account/transfer",
        sender,
        json!({ "recipientId": recipient, "amount": 3.00 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "Transfer failed");
    let body = response_json(response).await;
    assert_eq!(body["message"], "Transfer successful");

    // Sender balance
    let response = app
        .clone()
        .oneshot(get_request("/account/balance", sender))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["balance"], json!(7.0));

    // Recipient balance
    let response = app
        .clone()
        .oneshot(get_request("/account/balance", recipient))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["balance"], json!(5.0));

    // Ledger entry, annotated from each side
    let response = app
        .clone()
        .oneshot(get_request("/account/transactions", sender))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["totalTransactions"], json!(1));
    assert_eq!(body["transactions"][0]["amount"], json!(3.0));
    assert_eq!(body["transactions"][0]["direction"], "sent");

    let response = app
        .clone()
        .oneshot(get_request("/account/transactions", recipient))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["transactions"][0]["direction"], "received");
}

#[tokio::test]
async fn test_transfer_insufficient_balance() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let sender = common::seed_account(&pool, 500).await;
    let recipient = common::seed_account(&pool, 0).await;

    let req = json_request(
        "POST",
        "/account/transfer",
        sender,
        json!({ "recipientId": recipient, "amount": 6.00 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "insufficient_balance");

    // Both sides untouched
    assert_eq!(common::raw_balance(&pool, sender).await, Some(500));
    assert_eq!(common::raw_balance(&pool, recipient).await, Some(0));
}

#[tokio::test]
async fn test_transfer_to_self_rejected() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let user = common::seed_account(&pool, 1000).await;

    let req = json_request(
        "POST",
        "/account/transfer",
        user,
        json!({ "recipientId": user, "amount": 1.00 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "self_transfer");

    assert_eq!(common::raw_balance(&pool, user).await, Some(1000));
}

#[tokio::test]
async fn test_transfer_non_positive_amount_rejected() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let sender = common::seed_account(&pool, 1000).await;
    let recipient = common::seed_account(&pool, 0).await;

    for amount in [json!(0), json!(-5.00)] {
        let req = json_request(
            "POST",
            "/account/transfer",
            sender,
            json!({ "recipientId": recipient, "amount": amount }),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["error_code"], "invalid_amount");
    }

    assert_eq!(common::raw_balance(&pool, sender).await, Some(1000));
}

#[tokio::test]
async fn test_transfer_unknown_recipient() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let sender = common::seed_account(&pool, 1000).await;

    let req = json_request(
        "POST",
        "/account/transfer",
        sender,
        json!({ "recipientId": Uuid::new_v4(), "amount": 1.00 }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "recipient_not_found");
}

#[tokio::test]
async fn test_missing_identity_header() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let req = Request::builder()
        .method("GET")
        .uri("/account/balance")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_balance_unknown_account() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(get_request("/account/balance", Uuid::new_v4()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "account_not_found");
}

#[tokio::test]
async fn test_transactions_pagination() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let sender = common::seed_account(&pool, 100_000).await;
    let recipient = common::seed_account(&pool, 0).await;

    for _ in 0..12 {
        let req = json_request(
            "POST",
            "/account/transfer",
            sender,
            json!({ "recipientId": recipient, "amount": 1.00 }),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_request("/account/transactions?page=2&limit=5", sender))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["currentPage"], json!(2));
    assert_eq!(body["totalPages"], json!(3));
    assert_eq!(body["totalTransactions"], json!(12));
    assert_eq!(body["transactions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    // Provision a fresh account; the seed is random but bounded
    let user = Uuid::new_v4();
    let req = json_request("POST", "/accounts", user, json!({ "userId": user }));
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let balance = body["balance"].as_f64().unwrap();
    assert!((1.0..=10000.0).contains(&balance));

    // Provisioning twice fails
    let req = json_request("POST", "/accounts", user, json!({ "userId": user }));
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "account_exists");

    // Closing with funds remaining fails
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/accounts/{}", user))
        .header("X-User-Id", user.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "balance_not_zero");

    // Drain the account, then close it
    let sink = common::seed_account(&pool, 0).await;
    let remaining = common::raw_balance(&pool, user).await.unwrap();
    let req = json_request(
        "POST",
        "/account/transfer",
        user,
        json!({ "recipientId": sink, "amount": payflow::domain::money::to_major_units(remaining) }),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/accounts/{}", user))
        .header("X-User-Id", user.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(common::raw_balance(&pool, user).await, None);

    // The closure cascade removed the drain transfer from the ledger
    let response = app
        .clone()
        .oneshot(get_request("/account/transactions", sink))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["totalTransactions"], json!(0));
}

#[tokio::test]
async fn test_cannot_manage_other_users_account() {
    let pool = common::setup_test_db().await;
    let app = test_app(pool.clone());

    let caller = common::seed_account(&pool, 0).await;
    let victim = common::seed_account(&pool, 0).await;

    let req = json_request("POST", "/accounts", caller, json!({ "userId": Uuid::new_v4() }));
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/accounts/{}", victim))
        .header("X-User-Id", caller.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
