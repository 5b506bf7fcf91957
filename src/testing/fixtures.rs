//! # 测试数据 Fixtures
//!
//! 提供测试用的数据结构和预设数据

use chrono::{NaiveDateTime, Utc};
use entity::users;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::auth::password::hash_password;
use crate::error::Result;
use crate::subscription::Tier;

/// 测试用户的默认密码
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// 用户测试数据构建器
pub struct UserFixture {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub is_admin: bool,
    pub email_verified: bool,
    pub tier: String,
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub ends_at: Option<NaiveDateTime>,
    pub two_factor_secret: Option<String>,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            email: "seeker@example.com".to_string(),
            name: Some("Test Seeker".to_string()),
            password: TEST_PASSWORD.to_string(),
            is_admin: false,
            email_verified: true,
            tier: Tier::Free.as_str().to_string(),
            status: None,
            customer_id: None,
            subscription_id: None,
            ends_at: None,
            two_factor_secret: None,
        }
    }
}

impl UserFixture {
    /// 创建新的用户 fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// 设置为管理员
    #[must_use]
    pub const fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    #[must_use]
    pub const fn unverified(mut self) -> Self {
        self.email_verified = false;
        self
    }

    /// 直接写入等级字符串，可用于测试非规范写法
    #[must_use]
    pub fn tier(mut self, tier: &str) -> Self {
        self.tier = tier.to_string();
        self
    }

    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    #[must_use]
    pub fn customer_id(mut self, customer_id: &str) -> Self {
        self.customer_id = Some(customer_id.to_string());
        self
    }

    #[must_use]
    pub fn subscription_id(mut self, subscription_id: &str) -> Self {
        self.subscription_id = Some(subscription_id.to_string());
        self
    }

    #[must_use]
    pub const fn ends_at(mut self, ends_at: NaiveDateTime) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// 以给定密钥启用双因素认证
    #[must_use]
    pub fn two_factor(mut self, secret: &str) -> Self {
        self.two_factor_secret = Some(secret.to_string());
        self
    }

    /// 写入数据库并返回模型
    pub async fn insert(self, db: &DatabaseConnection) -> Result<users::Model> {
        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            email: Set(self.email),
            name: Set(self.name),
            password_hash: Set(hash_password(&self.password, 4)?),
            is_admin: Set(self.is_admin),
            email_verified: Set(self.email_verified),
            email_verification_token: Set(None),
            subscription_tier: Set(self.tier),
            subscription_status: Set(self.status),
            stripe_customer_id: Set(self.customer_id),
            stripe_subscription_id: Set(self.subscription_id),
            subscription_ends_at: Set(self.ends_at),
            two_factor_enabled: Set(self.two_factor_secret.is_some()),
            two_factor_secret: Set(self.two_factor_secret),
            password_reset_token: Set(None),
            password_reset_expires: Set(None),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(user.insert(db).await?)
    }
}
