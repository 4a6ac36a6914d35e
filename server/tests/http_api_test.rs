//! HTTP API integration tests.
//!
//! Drives the real router with `tower::ServiceExt::oneshot` over the
//! in-memory collaborators, so every route, extractor and error mapping is
//! exercised without a database.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests can unwrap
#![allow(clippy::too_many_lines)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use product_reviews_core::{ProductId, Rating, RatingAggregate, Requester, UserId};
use product_reviews_server::{AppState, build_router};
use product_reviews_testing::{ReviewTestHarness, StaticIdentityProvider};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const COMMENT: &str = "Works well and arrived on time.";

struct TestApp {
    harness: ReviewTestHarness,
    identity: StaticIdentityProvider,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let harness = ReviewTestHarness::new();
        let identity = StaticIdentityProvider::new();
        let state = AppState::new(harness.services.clone(), Arc::new(identity.clone()));
        Self {
            router: build_router(state),
            harness,
            identity,
        }
    }

    fn login(&self, requester: Requester) -> String {
        let token = format!("token-{}", requester.user_id);
        self.identity.insert(token.clone(), requester);
        token
    }

    fn customer(&self) -> (UserId, String) {
        let user = UserId::new();
        (user, self.login(Requester::customer(user)))
    }

    fn admin(&self) -> String {
        self.login(Requester::admin(UserId::new()))
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn submit(&self, token: &str, product: ProductId, rating: i64) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/reviews",
            Some(token),
            Some(json!({
                "productId": product,
                "rating": rating,
                "comment": COMMENT,
            })),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert!(body.get("database").is_none());
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let app = TestApp::new();
    let id = "6f9619ff-8b86-4011-b42d-00c04fc964ff";

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Correlation-ID", id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-correlation-id"], id);
}

#[tokio::test]
async fn test_submit_review_and_read_rating() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (buyer, token) = app.customer();
    app.harness.orders.add_delivered(buyer, product);

    let (status, review) = app
        .send(
            Method::POST,
            "/api/reviews",
            Some(&token),
            Some(json!({
                "productId": product,
                "rating": 4,
                "title": "  Solid  ",
                "comment": COMMENT,
                "images": ["https://cdn.example.com/a.jpg"],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["userId"], json!(buyer));
    assert_eq!(review["productId"], json!(product));
    assert_eq!(review["rating"], 4);
    assert_eq!(review["title"], "Solid");
    assert_eq!(review["verifiedPurchase"], true);
    assert_eq!(review["isApproved"], true);
    assert_eq!(review["helpfulCount"], 0);
    assert!(review.get("helpfulVoters").is_none());

    let (status, rating) = app
        .get(&format!("/api/products/{product}/rating"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["average"], 4.0);
    assert_eq!(rating["count"], 1);
    assert_eq!(
        rating["breakdown"],
        json!({"1": 0, "2": 0, "3": 0, "4": 1, "5": 0})
    );

    let review_id = review["id"].as_str().unwrap();
    let (status, fetched) = app.get(&format!("/api/reviews/{review_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], review["id"]);
}

#[tokio::test]
async fn test_authentication_required() {
    let app = TestApp::new();
    let product = app.harness.product();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/reviews",
            None,
            Some(json!({"productId": product, "rating": 5, "comment": COMMENT})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app.submit("unknown-token", product, 5).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(app.harness.reviews.is_empty());
}

#[tokio::test]
async fn test_validation_errors_name_the_field() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/reviews",
            Some(&token),
            Some(json!({"productId": product, "rating": 5, "comment": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "comment");

    let (status, body) = app.submit(&token, product, 6).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "rating");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/reviews",
            Some(&token),
            Some(json!({"productId": product, "rating": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert!(app.harness.reviews.is_empty());
    assert_eq!(app.harness.aggregate(product).count, 0);
}

#[tokio::test]
async fn test_duplicate_and_missing_product() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();

    let (status, _) = app.submit(&token, product, 5).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.submit(&token, product, 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_REVIEW");
    assert_eq!(app.harness.aggregate(product).count, 1);

    let (status, body) = app.submit(&token, ProductId::new(), 3).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_requires_owner_or_admin() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, owner) = app.customer();
    let (_, stranger) = app.customer();

    let (_, review) = app.submit(&owner, product, 2).await;
    let uri = format!("/api/reviews/{}", review["id"].as_str().unwrap());

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&stranger), Some(json!({"rating": 5})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["message"], "You can only modify your own reviews");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&owner), Some(json!({"rating": 5})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 5);
    assert_eq!(body["comment"], COMMENT);
    assert_eq!(app.harness.aggregate(product).breakdown.get(5), 1);

    let admin = app.admin();
    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({"comment": "Edited by a moderator for tone."})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], review["userId"]);
}

#[tokio::test]
async fn test_delete_review_resets_rating() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();

    let (_, review) = app.submit(&token, product, 4).await;
    let review_id = review["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/reviews/{review_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true, "reviewId": review_id}));

    let (_, rating) = app
        .get(&format!("/api/products/{product}/rating"), None)
        .await;
    assert_eq!(rating["count"], 0);
    assert_eq!(rating["average"], 0.0);

    let (status, _) = app.get(&format!("/api/reviews/{review_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/reviews/{review_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_helpful_votes() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, author) = app.customer();
    let (_, reader) = app.customer();

    let (_, review) = app.submit(&author, product, 5).await;
    let uri = format!("/api/reviews/{}/helpful", review["id"].as_str().unwrap());

    let (status, body) = app.send(Method::POST, &uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SELF_VOTE");

    let (status, body) = app.send(Method::POST, &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"helpfulCount": 1}));

    let (status, body) = app.send(Method::POST, &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_VOTED");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/reviews/{}/helpful", ProductId::new()),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_product_reviews() {
    let app = TestApp::new();
    let product = app.harness.product();
    for rating in [3, 1, 5] {
        let (_, token) = app.customer();
        app.submit(&token, product, rating).await;
    }

    let (status, page) = app
        .get(
            &format!("/api/products/{product}/reviews?sortBy=rating&sortOrder=asc&limit=2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["pages"], 2);
    let ratings: Vec<i64> = page["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rating"].as_i64().unwrap())
        .collect();
    assert_eq!(ratings, vec![1, 3]);

    let (status, page) = app
        .get(&format!("/api/products/{product}/reviews?page=2&limit=2"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let app = TestApp::new();
    let product = app.harness.product();

    let (status, body) = app.get("/api/products/not-a-uuid/reviews", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app
        .get(&format!("/api/products/{product}/reviews?sortBy=price"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = app.get("/api/reviews/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_can_review_and_my_reviews() {
    let app = TestApp::new();
    let product = app.harness.product();
    let other = app.harness.product();
    let (buyer, token) = app.customer();
    app.harness.orders.add_delivered(buyer, product);

    let uri = format!("/api/products/{product}/can-review");
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"canReview": true, "hasPurchased": true, "hasReviewed": false})
    );

    let (_, review) = app.submit(&token, product, 4).await;
    app.submit(&token, other, 2).await;

    let (_, body) = app.get(&uri, Some(&token)).await;
    assert_eq!(body["canReview"], false);
    assert_eq!(body["hasReviewed"], true);
    assert_eq!(body["existingReviewId"], review["id"]);

    let (status, page) = app.get("/api/users/me/reviews", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);

    let (status, _) = app.get("/api/users/me/reviews", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_reconciles_stale_rating() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();
    let admin = app.admin();

    // Every attempt of the post-commit refresh fails.
    app.harness.catalog.fail_next_writes(2);
    let (status, _) = app.submit(&token, product, 5).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.harness.aggregate(product).count, 0);

    let audit_uri = format!("/api/admin/products/{product}/rating/audit");
    let recompute_uri = format!("/api/admin/products/{product}/rating/recompute");

    let (status, body) = app.get(&audit_uri, Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, audit) = app.get(&audit_uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["consistent"], false);
    assert_eq!(audit["stored"]["count"], 0);
    assert_eq!(audit["computed"]["count"], 1);

    let (status, aggregate) = app
        .send(Method::POST, &recompute_uri, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(aggregate["count"], 1);
    assert_eq!(aggregate["average"], 5.0);

    let (_, audit) = app.get(&audit_uri, Some(&admin)).await;
    assert_eq!(audit["consistent"], true);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/admin/products/{}/rating/recompute", ProductId::new()),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_audit_detects_drifted_rating() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();
    let admin = app.admin();
    app.submit(&token, product, 4).await;

    let drifted = RatingAggregate::from_ratings(&[Rating::new(1).unwrap(); 3]);
    app.harness.catalog.set_aggregate(product, drifted);

    let (status, rating) = app
        .get(&format!("/api/products/{product}/rating"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["count"], 3);

    let audit_uri = format!("/api/admin/products/{product}/rating/audit");
    let (_, audit) = app.get(&audit_uri, Some(&admin)).await;
    assert_eq!(audit["consistent"], false);
    assert_eq!(audit["stored"]["count"], 3);
    assert_eq!(audit["computed"]["average"], 4.0);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/admin/products/{product}/rating/recompute"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.harness.aggregate(product).count, 1);
}

#[tokio::test]
async fn test_update_null_title_clears_it() {
    let app = TestApp::new();
    let product = app.harness.product();
    let (_, token) = app.customer();

    let (_, review) = app
        .send(
            Method::POST,
            "/api/reviews",
            Some(&token),
            Some(json!({
                "productId": product,
                "rating": 3,
                "title": "First impressions",
                "comment": COMMENT,
            })),
        )
        .await;
    let uri = format!("/api/reviews/{}", review["id"].as_str().unwrap());

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({"rating": 4})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "First impressions");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({"title": null})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("title").is_none_or(Value::is_null));
    assert_eq!(body["rating"], 4);
}
