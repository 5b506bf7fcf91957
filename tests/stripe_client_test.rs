//! # Stripe 客户端测试
//!
//! 用 wiremock 模拟 Stripe REST 接口

use house_membership::billing::StripeClient;
use house_membership::config::BillingConfig;
use house_membership::error::AppError;
use house_membership::subscription::Tier;
use house_membership::testing::{UserFixture, create_test_db};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, secret_key: Option<&str>) -> StripeClient {
    let config = BillingConfig {
        stripe_secret_key: secret_key.map(str::to_string),
        api_base: server.uri(),
        ..BillingConfig::default()
    };
    StripeClient::new(&config, "https://house33.example").unwrap()
}

#[tokio::test]
async fn checkout_session_carries_user_and_tier_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(body_string_contains("metadata%5Btier%5D=initiate"))
        .and(body_string_contains("customer_email=seeker%40example.com"))
        .and(body_string_contains("price_1QInitiateMonthly33rdHouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_abc",
            "url": "https://checkout.stripe.com/c/pay/cs_test_abc",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = create_test_db().await.unwrap();
    let user = UserFixture::new().insert(&db).await.unwrap();
    let stripe = client_for(&server, Some("sk_test_123"));

    let session = stripe.create_checkout_session(&user, Tier::Initiate).await.unwrap();
    assert_eq!(session.id, "cs_test_abc");
    assert!(session.url.unwrap().contains("cs_test_abc"));
}

#[tokio::test]
async fn existing_customer_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("customer=cus_existing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_2", "url": null })))
        .expect(1)
        .mount(&server)
        .await;

    let db = create_test_db().await.unwrap();
    let user = UserFixture::new().customer_id("cus_existing").insert(&db).await.unwrap();
    let session = client_for(&server, Some("sk_test_123"))
        .create_checkout_session(&user, Tier::Elder)
        .await
        .unwrap();
    assert_eq!(session.url, None);
}

#[tokio::test]
async fn stripe_errors_surface_as_billing_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "No such price: 'price_1QSeekerMonthly33rdHouse'" }
        })))
        .mount(&server)
        .await;

    let db = create_test_db().await.unwrap();
    let user = UserFixture::new().insert(&db).await.unwrap();
    let err = client_for(&server, Some("sk_test_123"))
        .create_checkout_session(&user, Tier::Seeker)
        .await
        .unwrap_err();
    match err {
        AppError::Billing { message, .. } => assert!(message.contains("No such price")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_key_and_free_tier_are_rejected_locally() {
    let server = MockServer::start().await;
    let db = create_test_db().await.unwrap();
    let user = UserFixture::new().insert(&db).await.unwrap();

    let unconfigured = client_for(&server, None);
    assert!(!unconfigured.is_configured());
    assert!(matches!(
        unconfigured.create_checkout_session(&user, Tier::Seeker).await,
        Err(AppError::Config { .. })
    ));

    let configured = client_for(&server, Some("sk_test_123"));
    assert!(matches!(
        configured.create_checkout_session(&user, Tier::Free).await,
        Err(AppError::Validation { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn seed_products_creates_one_price_per_paid_tier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "prod_1" })))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/prices"))
        .and(body_string_contains("recurring%5Binterval%5D=month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "price_1" })))
        .expect(3)
        .mount(&server)
        .await;

    let seeded = client_for(&server, Some("sk_test_123")).seed_products().await.unwrap();
    let tiers: Vec<_> = seeded.iter().map(|product| product.tier).collect();
    assert_eq!(tiers, vec![Tier::Seeker, Tier::Initiate, Tier::Elder]);
    assert_eq!(seeded[0].unit_amount, 999);
    assert_eq!(seeded[2].unit_amount, 4999);
}
