//! Black-box HTTP tests that never reach the database.
//!
//! Every request here is rejected or answered before a connection is
//! acquired, so the server runs with a pool that cannot connect.

use kiosk_core::UserId;
use kiosk_integration_tests::{TestServer, mint_forged_token, mint_token, mint_token_expiring};
use reqwest::StatusCode;
use serde_json::{Value, json};

const USER: UserId = UserId::new(7);

async fn body(res: reqwest::Response) -> Value {
    res.json().await.expect("response body is JSON")
}

#[tokio::test]
async fn health_is_ok_without_database() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn readiness_reports_unreachable_database() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv.client.get(srv.url("/health/ready")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .get(srv.url("/health"))
        .header("x-request-id", "edge-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "edge-42");

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let srv = TestServer::spawn_without_database().await;

    for (method, path) in [
        (reqwest::Method::GET, "/products"),
        (reqwest::Method::GET, "/products/1"),
        (reqwest::Method::GET, "/products/1?update=true"),
        (reqwest::Method::GET, "/address"),
        (reqwest::Method::POST, "/address"),
        (reqwest::Method::PUT, "/address"),
        (reqwest::Method::POST, "/orders"),
        (reqwest::Method::GET, "/orders/1"),
    ] {
        let res = srv
            .client
            .request(method.clone(), srv.url(path))
            .json(&json!({}))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        let json = body(res).await;
        assert_eq!(json["message"], "Nicht autorisiert!");
        assert_eq!(json["errorType"], "token");
    }
}

#[tokio::test]
async fn forged_or_expired_token_is_forbidden() {
    let srv = TestServer::spawn_without_database().await;

    for token in [
        mint_forged_token(USER),
        mint_token_expiring(USER, chrono::Duration::hours(-1)),
        "not-a-jwt".to_owned(),
    ] {
        let res = srv
            .client
            .get(srv.url("/address"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let json = body(res).await;
        assert_eq!(json["message"], "Token ungültig!");
        assert_eq!(json["errorType"], "token");
    }
}

#[tokio::test]
async fn update_with_only_an_id_is_rejected() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .put(srv.url("/address"))
        .bearer_auth(mint_token(USER))
        .json(&json!({ "id": 5 }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "Anfrage ungültig!");
}

#[tokio::test]
async fn update_without_id_is_rejected() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .put(srv.url("/address"))
        .bearer_auth(mint_token(USER))
        .json(&json!({ "city": "Berlin" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_address_requires_fields() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .post(srv.url("/address"))
        .bearer_auth(mint_token(USER))
        .json(&json!({ "name": "Home", "street": "Main St", "city": "X", "country": "DE" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "Anfrage ungültig!");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .post(srv.url("/orders"))
        .bearer_auth(mint_token(USER))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "Anfrage ungültig!");
}

#[tokio::test]
async fn order_validation_happens_before_storage() {
    let srv = TestServer::spawn_without_database().await;
    let token = mint_token(USER);

    for order in [
        json!({ "addressId": 1, "products": [], "sumPrice": 0 }),
        json!({ "addressId": 1, "products": [{ "id": 1, "quantity": 0 }], "sumPrice": 0 }),
        json!({ "addressId": 0, "products": [{ "id": 1 }], "sumPrice": 1 }),
        json!({ "addressId": 1, "products": [{ "id": 1 }] }),
        json!({ "addressId": 1, "products": [{ "id": 1 }], "sumPrice": "zehn" }),
    ] {
        let res = srv
            .client
            .post(srv.url("/orders"))
            .bearer_auth(&token)
            .json(&order)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{order}");
        assert_eq!(body(res).await["message"], "Anfrage ungültig!");
    }
}

#[tokio::test]
async fn non_numeric_order_id_is_rejected() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .get(srv.url("/orders/abc"))
        .bearer_auth(mint_token(USER))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_failure_is_a_generic_server_error() {
    let srv = TestServer::spawn_without_database().await;

    let res = srv
        .client
        .get(srv.url("/address"))
        .bearer_auth(mint_token(USER))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body(res).await["message"],
        "Fehler beim Zugriff auf die Datenbank."
    );
}
