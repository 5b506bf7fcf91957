//! # 实体定义测试
//!
//! 测试会员系统 Sea-ORM 实体定义的正确性

#[cfg(test)]
mod tests {
    use crate::{login_history, user_sessions, users};
    use sea_orm::Set;

    #[tokio::test]
    async fn test_user_creation() {
        let user = users::ActiveModel {
            email: Set("seeker@example.com".to_string()),
            password_hash: Set("hash123".to_string()),
            subscription_tier: Set("seeker".to_string()),
            two_factor_enabled: Set(false),
            ..Default::default()
        };

        assert_eq!(user.email.as_ref(), "seeker@example.com");
        assert_eq!(user.subscription_tier.as_ref(), "seeker");
        assert_eq!(user.two_factor_enabled.as_ref(), &false);
    }

    #[tokio::test]
    async fn test_session_creation() {
        let session = user_sessions::ActiveModel {
            user_id: Set(7),
            session_token: Set("ab".repeat(32)),
            device_info: Set("Mac".to_string()),
            ..Default::default()
        };

        assert_eq!(session.user_id.as_ref(), &7);
        assert_eq!(session.session_token.as_ref().len(), 64);
        assert_eq!(session.device_info.as_ref(), "Mac");
    }

    #[tokio::test]
    async fn test_login_history_creation() {
        let entry = login_history::ActiveModel {
            user_id: Set(7),
            login_method: Set("password".to_string()),
            success: Set(false),
            failure_reason: Set(Some("invalid_password".to_string())),
            ..Default::default()
        };

        assert_eq!(entry.login_method.as_ref(), "password");
        assert_eq!(entry.success.as_ref(), &false);
        assert_eq!(
            entry.failure_reason.as_ref().as_deref(),
            Some("invalid_password")
        );
    }

    #[test]
    fn test_password_fields_not_serialized() {
        let now = chrono::Utc::now().naive_utc();
        let user = users::Model {
            id: 1,
            email: "elder@example.com".to_string(),
            name: None,
            password_hash: "secret-hash".to_string(),
            is_admin: false,
            email_verified: true,
            email_verification_token: None,
            subscription_tier: "elder".to_string(),
            subscription_status: Some("active".to_string()),
            stripe_customer_id: None,
            stripe_subscription_id: Some("sub_1".to_string()),
            subscription_ends_at: None,
            two_factor_enabled: true,
            two_factor_secret: Some("JBSWY3DPEHPK3PXP".to_string()),
            password_reset_token: Some("digest".to_string()),
            password_reset_expires: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("JBSWY3DPEHPK3PXP"));
        assert!(json.contains("sub_1"));
    }
}
