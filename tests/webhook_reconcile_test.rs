//! # Webhook 对账集成测试
//!
//! 在内存数据库上验证账单事件对用户订阅字段的覆盖写，以及 webhook 入口的失败开放应答

use chrono::Utc;
use entity::users;
use house_membership::subscription::webhook::compute_signature;
use house_membership::subscription::{
    BillingEvent, ReconcileOutcome, SubscriptionReconciler, handle_webhook,
};
use house_membership::testing::{TEST_WEBHOOK_SECRET, UserFixture, create_test_db, init_test_env};
use pretty_assertions::assert_eq;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use std::sync::Arc;

async fn setup() -> (Arc<DatabaseConnection>, SubscriptionReconciler) {
    init_test_env();
    let db = Arc::new(create_test_db().await.expect("create test db"));
    let reconciler = SubscriptionReconciler::new(db.clone());
    (db, reconciler)
}

async fn reload(db: &DatabaseConnection, id: i32) -> users::Model {
    users::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query user")
        .expect("user exists")
}

/// 只比较订阅相关字段
fn subscription_state(
    user: &users::Model,
) -> (String, Option<String>, Option<String>, Option<chrono::NaiveDateTime>) {
    (
        user.subscription_tier.clone(),
        user.subscription_status.clone(),
        user.stripe_subscription_id.clone(),
        user.subscription_ends_at,
    )
}

fn checkout_event(user_id: i32, tier: &str, subscription: &str) -> BillingEvent {
    BillingEvent::from_parts(
        BillingEvent::CHECKOUT_COMPLETED,
        &json!({
            "id": "cs_test_1",
            "metadata": { "userId": user_id.to_string(), "tier": tier },
            "subscription": subscription,
            "customer": "cus_123",
        }),
    )
}

fn deleted_event(user_id: i32) -> BillingEvent {
    BillingEvent::from_parts(
        BillingEvent::SUBSCRIPTION_DELETED,
        &json!({ "id": "sub_1", "metadata": { "userId": user_id.to_string() } }),
    )
}

fn updated_event(user_id: i32, status: &str, cancel_at: Option<i64>) -> BillingEvent {
    BillingEvent::from_parts(
        BillingEvent::SUBSCRIPTION_UPDATED,
        &json!({
            "id": "sub_1",
            "status": status,
            "cancel_at": cancel_at,
            "metadata": { "userId": user_id.to_string() },
        }),
    )
}

#[tokio::test]
async fn checkout_completed_activates_tier() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new().insert(&db).await.unwrap();

    let outcome = reconciler
        .apply(&checkout_event(user.id, "initiate", "sub_1"), "test")
        .await
        .unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Applied { rows: 1 }));

    let user = reload(&db, user.id).await;
    assert_eq!(user.subscription_tier, "initiate");
    assert_eq!(user.subscription_status.as_deref(), Some("active"));
    assert_eq!(user.stripe_subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(user.stripe_customer_id.as_deref(), Some("cus_123"));
}

#[tokio::test]
async fn checkout_completed_is_idempotent() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new().insert(&db).await.unwrap();
    let event = checkout_event(user.id, "seeker", "sub_9");

    reconciler.apply(&event, "test").await.unwrap();
    let once = subscription_state(&reload(&db, user.id).await);
    reconciler.apply(&event, "test").await.unwrap();
    let twice = subscription_state(&reload(&db, user.id).await);

    assert_eq!(once, twice);
}

#[tokio::test]
async fn subscription_deleted_resets_elder_to_free() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new()
        .tier("elder")
        .status("active")
        .subscription_id("sub_1")
        .insert(&db)
        .await
        .unwrap();

    reconciler.apply(&deleted_event(user.id), "test").await.unwrap();

    let user = reload(&db, user.id).await;
    assert_eq!(user.subscription_tier, "free");
    assert_eq!(user.subscription_status.as_deref(), Some("canceled"));
    assert_eq!(user.stripe_subscription_id, None);
}

#[tokio::test]
async fn deleted_after_updated_always_ends_canceled() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new()
        .tier("initiate")
        .status("active")
        .subscription_id("sub_1")
        .insert(&db)
        .await
        .unwrap();

    let cancel_at = Utc::now().timestamp() + 86_400;
    reconciler
        .apply(&updated_event(user.id, "active", Some(cancel_at)), "test")
        .await
        .unwrap();
    let updated = reload(&db, user.id).await;
    assert!(updated.subscription_ends_at.is_some());

    for _ in 0..2 {
        reconciler.apply(&deleted_event(user.id), "test").await.unwrap();
        let user = reload(&db, user.id).await;
        assert_eq!(user.subscription_tier, "free");
        assert_eq!(user.subscription_status.as_deref(), Some("canceled"));
    }
}

#[tokio::test]
async fn subscription_updated_without_cancel_clears_end_date() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new()
        .tier("seeker")
        .ends_at(Utc::now().naive_utc())
        .insert(&db)
        .await
        .unwrap();

    reconciler
        .apply(&updated_event(user.id, "trialing", None), "test")
        .await
        .unwrap();

    let user = reload(&db, user.id).await;
    assert_eq!(user.subscription_status.as_deref(), Some("trialing"));
    assert_eq!(user.subscription_ends_at, None);
    assert_eq!(user.subscription_tier, "seeker");
}

#[tokio::test]
async fn invoice_failure_marks_past_due_by_subscription() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new()
        .tier("seeker")
        .status("active")
        .subscription_id("sub_pay")
        .insert(&db)
        .await
        .unwrap();
    let bystander = UserFixture::new()
        .email("other@example.com")
        .tier("seeker")
        .status("active")
        .subscription_id("sub_other")
        .insert(&db)
        .await
        .unwrap();

    let event = BillingEvent::from_parts(
        BillingEvent::INVOICE_PAYMENT_FAILED,
        &json!({ "id": "in_1", "subscription": "sub_pay" }),
    );
    reconciler.apply(&event, "test").await.unwrap();

    assert_eq!(
        reload(&db, user.id).await.subscription_status.as_deref(),
        Some("past_due")
    );
    assert_eq!(
        reload(&db, bystander.id).await.subscription_status.as_deref(),
        Some("active")
    );
}

#[tokio::test]
async fn events_missing_identifiers_are_skipped() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new().insert(&db).await.unwrap();
    let before = subscription_state(&user);

    let no_tier = BillingEvent::from_parts(
        BillingEvent::CHECKOUT_COMPLETED,
        &json!({ "metadata": { "userId": user.id.to_string() }, "subscription": "sub_x" }),
    );
    let no_user = BillingEvent::from_parts(
        BillingEvent::SUBSCRIPTION_DELETED,
        &json!({ "metadata": {} }),
    );

    let no_status = BillingEvent::from_parts(
        BillingEvent::SUBSCRIPTION_UPDATED,
        &json!({
            "id": "sub_1",
            "cancel_at": Utc::now().timestamp() + 86_400,
            "metadata": { "userId": user.id.to_string() },
        }),
    );

    for event in [no_tier, no_user, no_status] {
        let outcome = reconciler.apply(&event, "test").await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Skipped { .. }));
    }
    assert_eq!(subscription_state(&reload(&db, user.id).await), before);
}

fn signed_header(payload: &[u8], secret: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let signature = compute_signature(secret, timestamp, payload).unwrap();
    format!("t={timestamp},v1={signature}")
}

#[tokio::test]
async fn signed_webhook_is_applied() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new().insert(&db).await.unwrap();
    let payload = serde_json::to_vec(&json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": 1_700_000_000,
        "data": { "object": {
            "metadata": { "userId": user.id.to_string(), "tier": "elder" },
            "subscription": "sub_elder",
        }},
    }))
    .unwrap();
    let header = signed_header(&payload, TEST_WEBHOOK_SECRET);

    let ack = handle_webhook(
        &reconciler,
        &payload,
        Some(&header),
        Some(TEST_WEBHOOK_SECRET),
        300,
        "test",
    )
    .await;

    assert!(ack.verified);
    assert!(ack.received);
    assert_eq!(ack.event_id.as_deref(), Some("evt_1"));
    assert_eq!(ack.error, None);
    assert_eq!(reload(&db, user.id).await.subscription_tier, "elder");
}

#[tokio::test]
async fn webhook_failures_are_acknowledged() {
    let (db, reconciler) = setup().await;
    let user = UserFixture::new().insert(&db).await.unwrap();
    let payload = serde_json::to_vec(&json!({
        "id": "evt_forged",
        "type": "checkout.session.completed",
        "data": { "object": {
            "metadata": { "userId": user.id.to_string(), "tier": "elder" },
            "subscription": "sub_forged",
        }},
    }))
    .unwrap();
    let forged = signed_header(&payload, "whsec_wrong");

    let cases = [
        (Some(forged.as_str()), Some(TEST_WEBHOOK_SECRET)),
        (None, Some(TEST_WEBHOOK_SECRET)),
        (Some(forged.as_str()), None),
    ];
    for (signature, secret) in cases {
        let ack = handle_webhook(&reconciler, &payload, signature, secret, 300, "test").await;
        assert!(ack.verified);
        assert!(!ack.received);
        assert!(ack.error.is_some());
    }

    assert_eq!(reload(&db, user.id).await.subscription_tier, "free");
}
