//! # 双因素认证
//!
//! TOTP：SHA1、6 位、30 秒步长、允许前后各 1 个步长的偏差。
//! 启用与停用都用一条 UPDATE 同时写 `two_factor_enabled` 和 `two_factor_secret`，
//! 两列不会出现一列有值一列为空的状态。

use chrono::Utc;
use entity::users;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AppError, Result};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECS: u64 = 30;

/// 新生成的密钥与 otpauth 链接
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorSetup {
    pub secret: String,
    pub otpauth_url: String,
}

/// 双因素认证门
pub struct TwoFactorGate {
    db: Arc<DatabaseConnection>,
    issuer: String,
}

impl TwoFactorGate {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, issuer: &str) -> Self {
        Self {
            db,
            issuer: issuer.to_string(),
        }
    }

    /// 生成新的 base32 密钥
    pub fn generate_secret(&self, account: &str) -> Result<TwoFactorSetup> {
        let secret = Secret::generate_secret();
        let secret_bytes = secret
            .to_bytes()
            .map_err(|e| AppError::internal(format!("TOTP 密钥生成失败: {e}")))?;

        let totp = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_SECS,
            secret_bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| AppError::internal(format!("TOTP 初始化失败: {e}")))?;

        Ok(TwoFactorSetup {
            secret: secret.to_encoded().to_string(),
            otpauth_url: totp.get_url(),
        })
    }

    /// 校验 6 位验证码；任何内部错误都视为校验失败
    #[must_use]
    pub fn verify(token: &str, secret: &str) -> bool {
        let token = token.trim();
        if token.len() != DIGITS || !token.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        let Ok(secret_bytes) = Secret::Encoded(secret.trim().to_string()).to_bytes() else {
            return false;
        };
        let Ok(totp) = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_SECS,
            secret_bytes,
            None,
            String::new(),
        ) else {
            return false;
        };

        totp.check_current(token).unwrap_or(false)
    }

    /// 当前时刻的验证码，供测试与调试使用
    pub fn current_code(secret: &str) -> Result<String> {
        let secret_bytes = Secret::Encoded(secret.to_string())
            .to_bytes()
            .map_err(|e| AppError::validation(format!("无效的 TOTP 密钥: {e}"), Some("secret")))?;
        let totp = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_SECS,
            secret_bytes,
            None,
            String::new(),
        )
        .map_err(|e| AppError::validation(format!("无效的 TOTP 密钥: {e}"), Some("secret")))?;
        totp.generate_current()
            .map_err(|e| AppError::internal_with_source("系统时间异常", e))
    }

    /// 启用：同时写入密钥与开关
    pub async fn enable(&self, user_id: i32, secret: &str) -> Result<()> {
        self.write_pair(user_id, true, Some(secret.to_string())).await
    }

    /// 停用：同时清空密钥与开关
    pub async fn disable(&self, user_id: i32) -> Result<()> {
        self.write_pair(user_id, false, None).await
    }

    /// 用户是否启用了双因素认证；用户不存在视为未启用
    pub async fn is_enabled(&self, user_id: i32) -> Result<bool> {
        Ok(users::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .is_some_and(|user| user.two_factor_enabled && user.two_factor_secret.is_some()))
    }

    async fn write_pair(&self, user_id: i32, enabled: bool, secret: Option<String>) -> Result<()> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::TwoFactorEnabled, Expr::value(enabled))
            .col_expr(users::Column::TwoFactorSecret, Expr::value(secret))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(users::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("user", user_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_secret() -> String {
        Secret::generate_secret().to_encoded().to_string()
    }

    #[test]
    fn test_current_code_verifies() {
        let secret = fresh_secret();
        let code = TwoFactorGate::current_code(&secret).unwrap();
        assert!(TwoFactorGate::verify(&code, &secret));
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        let secret = fresh_secret();
        assert!(!TwoFactorGate::verify("12345", &secret));
        assert!(!TwoFactorGate::verify("abcdef", &secret));
        assert!(!TwoFactorGate::verify("123456", "not base32 !!"));
        assert!(!TwoFactorGate::verify("123456", "SECRETXYZ"));
    }
}
