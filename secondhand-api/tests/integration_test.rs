use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use secondhand_api::middleware::issue_token;
use secondhand_api::{app, AppState};
use secondhand_core::{ProductFacts, Role};
use secondhand_offer::{MemoryStore, OfferLedger, ProfileRecord};
use secondhand_shared::pii::Masked;
use secondhand_store::app_config::AuthConfig;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    auth: AuthConfig,
    router: Router,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthConfig {
            jwt_secret: Masked("integration-secret".to_string()),
            jwt_expiration_seconds: 600,
        };
        let ledger = OfferLedger::new(store.clone(), store.clone(), store.clone());
        let state = AppState::new(ledger, store.clone(), store.clone(), store.clone(), auth.clone());

        Self {
            store,
            auth,
            router: app(state),
        }
    }

    fn account(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_profile(ProfileRecord::complete(id, name, "Bandung"));
        id
    }

    fn product(&self, owner_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.store.insert_product(ProductFacts {
            id,
            owner_id,
            name: "Kamera analog".to_string(),
            price: 2_000_000,
            thumbnail: "kamera.jpg".to_string(),
            sold: false,
            published: true,
        });
        id
    }

    fn token(&self, id: Uuid, role: Role) -> String {
        issue_token(&self.auth, id, "tester", role).unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let h = Harness::new();
    let (status, body) = h.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let h = Harness::new();

    let (status, body) = h.call("GET", "/v1/offers/placed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = h
        .call("GET", "/v1/offers/placed", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_negotiation_through_sale() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let other_buyer = h.account("Andi");
    let product = h.product(seller);

    let seller_token = h.token(seller, Role::User);
    let buyer_token = h.token(buyer, Role::User);
    let other_token = h.token(other_buyer, Role::User);

    let (status, offer) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&buyer_token),
            Some(json!({ "product_id": product, "price": 1_500_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(offer["accepted"], false);
    let offer_id = offer["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&other_token),
            Some(json!({ "product_id": product, "price": 1_200_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, revised) = h
        .call(
            "PUT",
            &format!("/v1/offers/{}/price", offer_id),
            Some(&buyer_token),
            Some(json!({ "price": 1_750_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revised["price_offer"], 1_750_000);

    let (status, listing) = h
        .call("GET", &format!("/v1/products/{}/offers", product), Some(&seller_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["offers"].as_array().unwrap().len(), 2);
    assert_eq!(listing["offers"][0]["buyer"]["name"], "Budi");

    let (status, toggled) = h
        .call(
            "PUT",
            &format!("/v1/offers/{}/acceptance", offer_id),
            Some(&seller_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["accepted"], true);

    // Accepted offers are frozen for the buyer.
    let (status, _) = h
        .call(
            "PUT",
            &format!("/v1/offers/{}/price", offer_id),
            Some(&buyer_token),
            Some(json!({ "price": 1_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, sold) = h
        .call(
            "PUT",
            &format!("/v1/products/{}/sold", product),
            Some(&seller_token),
            Some(json!({ "sold": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sold["retired_offers"], 1);

    let (_, listing) = h
        .call("GET", &format!("/v1/products/{}/offers", product), Some(&seller_token), None)
        .await;
    let offers = listing["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["offer_id"].as_str().unwrap(), offer_id);

    let (status, _) = h.call("GET", "/v1/offers/placed", Some(&other_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Sold products take no new offers.
    let (status, _) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&other_token),
            Some(json!({ "product_id": product, "price": 2_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_offer_validation_errors() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let product = h.product(seller);
    let seller_token = h.token(seller, Role::User);

    let (status, body) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&seller_token),
            Some(json!({ "product_id": product, "price": 10_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "you cannot buy your own product");

    let stranger = Uuid::new_v4();
    let (status, body) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&h.token(stranger, Role::User)),
            Some(json!({ "product_id": product, "price": 10_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "complete your profile first");

    let buyer = h.account("Budi");
    let (status, _) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&h.token(buyer, Role::User)),
            Some(json!({ "product_id": product, "price": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_explicit_acceptance_is_idempotent() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let product = h.product(seller);
    let seller_token = h.token(seller, Role::User);

    let (_, offer) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&h.token(buyer, Role::User)),
            Some(json!({ "product_id": product, "price": 900_000 })),
        )
        .await;
    let uri = format!("/v1/offers/{}/acceptance?accepted=true", offer["id"].as_str().unwrap());

    for _ in 0..2 {
        let (status, body) = h.call("PUT", &uri, Some(&seller_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], true);
    }

    // The buyer holds no seller scope over the offer.
    let (status, _) = h
        .call("PUT", &uri, Some(&h.token(buyer, Role::User)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_outsiders_are_forbidden_but_admins_pass() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let outsider = h.account("Dewi");
    let product = h.product(seller);

    let (_, offer) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&h.token(buyer, Role::User)),
            Some(json!({ "product_id": product, "price": 500_000 })),
        )
        .await;
    let detail_uri = format!("/v1/offers/{}", offer["id"].as_str().unwrap());
    let product_uri = format!("/v1/products/{}/offers", product);

    let outsider_token = h.token(outsider, Role::User);
    let (status, _) = h.call("GET", &detail_uri, Some(&outsider_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.call("GET", &product_uri, Some(&outsider_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.call("DELETE", &detail_uri, Some(&outsider_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = h.token(Uuid::new_v4(), Role::Admin);
    let (status, detail) = h.call("GET", &detail_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["seller"]["name"], "Sari");
    let (status, _) = h.call("GET", &product_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.call("DELETE", &detail_uri, Some(&h.token(buyer, Role::User)), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call("GET", &detail_uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seller_views_one_buyers_offers() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let first = h.product(seller);
    let second = h.product(seller);
    let buyer_token = h.token(buyer, Role::User);

    for product in [first, second] {
        let (status, _) = h
            .call(
                "POST",
                "/v1/offers",
                Some(&buyer_token),
                Some(json!({ "product_id": product, "price": 300_000 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = h
        .call(
            "GET",
            &format!("/v1/buyers/{}/offers", buyer),
            Some(&h.token(seller, Role::User)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buyer"]["name"], "Budi");
    assert_eq!(body["offers"].as_array().unwrap().len(), 2);

    let (_, received) = h
        .call("GET", "/v1/offers/received", Some(&h.token(seller, Role::User)), None)
        .await;
    assert_eq!(received.as_array().unwrap().len(), 2);
    assert_eq!(received[0]["counterparty"]["name"], "Budi");

    let (status, _) = h
        .call(
            "GET",
            &format!("/v1/buyers/{}/offers", Uuid::new_v4()),
            Some(&h.token(seller, Role::User)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_can_mark_sold() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let product = h.product(seller);
    let uri = format!("/v1/products/{}/sold", product);

    let (status, _) = h
        .call("PUT", &uri, Some(&h.token(buyer, Role::User)), Some(json!({ "sold": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .call("PUT", &uri, Some(&h.token(seller, Role::User)), Some(json!({ "sold": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["retired_offers"], 0);

    let (status, _) = h
        .call(
            "PUT",
            &format!("/v1/products/{}/sold", Uuid::new_v4()),
            Some(&h.token(seller, Role::User)),
            Some(json!({ "sold": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_input_gets_json_error_body() {
    let h = Harness::new();
    let seller = h.account("Sari");
    let buyer = h.account("Budi");
    let product = h.product(seller);
    let buyer_token = h.token(buyer, Role::User);

    let (status, body) = h
        .call(
            "POST",
            "/v1/offers",
            Some(&buyer_token),
            Some(json!({ "product_id": product, "price": "cheap" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = h
        .call(
            "PUT",
            &format!("/v1/offers/{}/acceptance?accepted=maybe", Uuid::new_v4()),
            Some(&h.token(seller, Role::User)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = h
        .call("GET", "/v1/offers/not-a-uuid", Some(&buyer_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
