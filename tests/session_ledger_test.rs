//! # 会话台账、登录历史与双因素开关测试

use entity::users;
use house_membership::auth::{
    ClientInfo, LoginAttempt, LoginHistory, LoginMethod, SessionLedger, TwoFactorGate,
};
use house_membership::testing::{UserFixture, create_test_db, init_test_env};
use rstest::rstest;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashSet;
use std::sync::Arc;

async fn setup() -> (Arc<DatabaseConnection>, users::Model) {
    init_test_env();
    let db = Arc::new(create_test_db().await.expect("create test db"));
    let user = UserFixture::new().insert(&db).await.expect("insert user");
    (db, user)
}

fn iphone() -> ClientInfo {
    ClientInfo {
        ip_address: Some("198.51.100.7".to_string()),
        user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".to_string()),
    }
}

#[tokio::test]
async fn sessions_get_unique_tokens_and_device_labels() {
    let (db, user) = setup().await;
    let ledger = SessionLedger::new(db, 30);

    let first = ledger.create_session(user.id, &iphone()).await.unwrap();
    let second = ledger.create_session(user.id, &ClientInfo::default()).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(first.len(), 64);

    let sessions = ledger.list_active_sessions(user.id).await.unwrap();
    assert_eq!(sessions.len(), 2);
    let labels: HashSet<_> = sessions.iter().map(|s| s.device_info.as_str()).collect();
    assert!(labels.contains("iPhone"));
    assert!(labels.contains("Unknown Device"));
}

#[tokio::test]
async fn expired_sessions_are_never_listed_or_validated() {
    let (db, user) = setup().await;
    let expired_ledger = SessionLedger::new(db.clone(), -1);
    let ledger = SessionLedger::new(db, 30);

    let stale = expired_ledger.create_session(user.id, &iphone()).await.unwrap();
    let live = ledger.create_session(user.id, &iphone()).await.unwrap();

    let sessions = ledger.list_active_sessions(user.id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_token, live);
    assert!(ledger.validate(&stale).await.unwrap().is_none());
    assert!(ledger.validate(&live).await.unwrap().is_some());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[tokio::test]
async fn revoke_all_other_sessions_keeps_exactly_one(#[case] count: usize) {
    let (db, user) = setup().await;
    let other = UserFixture::new()
        .email("other@example.com")
        .insert(&db)
        .await
        .unwrap();
    let ledger = SessionLedger::new(db, 30);

    let mut tokens = Vec::new();
    for _ in 0..count {
        tokens.push(ledger.create_session(user.id, &iphone()).await.unwrap());
    }
    ledger.create_session(other.id, &iphone()).await.unwrap();
    let keep = tokens[count / 2].clone();

    let revoked = ledger.revoke_all_other_sessions(user.id, &keep).await.unwrap();
    assert_eq!(revoked, (count - 1) as u64);

    let remaining = ledger.list_active_sessions(user.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].session_token, keep);
    assert_eq!(ledger.list_active_sessions(other.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn revoking_unknown_session_is_a_no_op() {
    let (db, user) = setup().await;
    let ledger = SessionLedger::new(db, 30);
    let token = ledger.create_session(user.id, &iphone()).await.unwrap();

    assert_eq!(ledger.revoke_session("no-such-token").await.unwrap(), 0);
    assert_eq!(ledger.revoke_session(&token).await.unwrap(), 1);
    assert!(ledger.list_active_sessions(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn revoking_by_id_is_scoped_to_the_owner() {
    let (db, user) = setup().await;
    let other = UserFixture::new()
        .email("other@example.com")
        .insert(&db)
        .await
        .unwrap();
    let ledger = SessionLedger::new(db, 30);
    ledger.create_session(user.id, &iphone()).await.unwrap();
    let session_id = ledger.list_active_sessions(user.id).await.unwrap()[0].id;

    assert_eq!(ledger.revoke_user_session_by_id(other.id, session_id).await.unwrap(), 0);
    assert_eq!(ledger.revoke_user_session_by_id(user.id, session_id + 100).await.unwrap(), 0);
    assert_eq!(ledger.list_active_sessions(user.id).await.unwrap().len(), 1);

    assert_eq!(ledger.revoke_user_session_by_id(user.id, session_id).await.unwrap(), 1);
    assert!(ledger.list_active_sessions(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn login_attempts_are_recorded_newest_first() {
    let (db, user) = setup().await;
    let history = LoginHistory::new(db);

    history
        .log_attempt(LoginAttempt::failed(
            user.id,
            LoginMethod::Password,
            &iphone(),
            "invalid_password",
        ))
        .await
        .unwrap();
    history
        .log_attempt(LoginAttempt::succeeded(user.id, LoginMethod::TwoFactor, &iphone()))
        .await
        .unwrap();

    let entries = history.recent(user.id, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].success);
    assert_eq!(entries[0].login_method, "2fa");
    assert!(!entries[1].success);
    assert_eq!(entries[1].failure_reason.as_deref(), Some("invalid_password"));
    assert_eq!(entries[1].device_info.as_deref(), Some("iPhone"));
}

#[tokio::test]
async fn failed_audit_write_never_reaches_the_caller() {
    let (db, user) = setup().await;
    let history = LoginHistory::new(db);
    let orphan = LoginAttempt::failed(
        user.id + 1000,
        LoginMethod::Password,
        &iphone(),
        "invalid_password",
    );

    assert!(history.record(&orphan).await.is_err());
    assert!(history.log_attempt(orphan).await.is_ok());
    assert!(history.recent(user.id + 1000, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn two_factor_enable_and_disable_move_as_a_pair() {
    let (db, user) = setup().await;
    let gate = TwoFactorGate::new(db.clone(), "The 33rd House");

    gate.enable(user.id, "SECRETXYZ").await.unwrap();
    assert!(gate.is_enabled(user.id).await.unwrap());
    let stored = users::Entity::find_by_id(user.id).one(db.as_ref()).await.unwrap().unwrap();
    assert_eq!(stored.two_factor_secret.as_deref(), Some("SECRETXYZ"));

    gate.disable(user.id).await.unwrap();
    assert!(!gate.is_enabled(user.id).await.unwrap());
    let stored = users::Entity::find_by_id(user.id).one(db.as_ref()).await.unwrap().unwrap();
    assert!(!stored.two_factor_enabled);
    assert_eq!(stored.two_factor_secret, None);
}

#[tokio::test]
async fn generated_secret_verifies_current_code() {
    let (db, _user) = setup().await;
    let gate = TwoFactorGate::new(db, "The 33rd House");

    let setup = gate.generate_secret("seeker@example.com").unwrap();
    assert!(setup.otpauth_url.starts_with("otpauth://totp/"));

    let code = TwoFactorGate::current_code(&setup.secret).unwrap();
    assert_eq!(code.len(), 6);
    assert!(TwoFactorGate::verify(&code, &setup.secret));
    assert!(!TwoFactorGate::verify("not-a-code", &setup.secret));
    assert!(!TwoFactorGate::verify(&code, "%%% not base32 %%%"));
}
