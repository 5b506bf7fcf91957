//! # 认证服务
//!
//! 注册、登录（含双因素第二步）、登出、密码重置与邮箱验证。
//! 每次密码或验证码校验的结果都会写入登录历史。

use chrono::{Duration, NaiveDateTime, Utc};
use entity::{user_sessions, users};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::challenge::ChallengeSigner;
use super::login_history::{LoginAttempt, LoginHistory, LoginMethod};
use super::password::{hash_password, validate_password, verify_password};
use super::session::{ClientInfo, SessionLedger};
use super::tokens::{generate_token, hash_token};
use super::two_factor::{TwoFactorGate, TwoFactorSetup};
use crate::config::AuthConfig;
use crate::email::EmailClient;
use crate::ensure_valid;
use crate::error::{AuthError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::subscription::Tier;
use crate::{ldebug, linfo, lwarn};

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// 返回给客户端的用户资料
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
    pub email_verified: bool,
    pub subscription_tier: Tier,
    pub subscription_status: Option<String>,
    pub subscription_ends_at: Option<NaiveDateTime>,
    pub two_factor_enabled: bool,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<&users::Model> for UserProfile {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
            email_verified: user.email_verified,
            subscription_tier: Tier::from_name_lenient(&user.subscription_tier),
            subscription_status: user.subscription_status.clone(),
            subscription_ends_at: user.subscription_ends_at,
            two_factor_enabled: user.two_factor_enabled,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// 登录结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    Authenticated {
        session_token: String,
        user: UserProfile,
    },
    TwoFactorRequired {
        challenge: String,
    },
}

/// 已鉴权的会话及其用户
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session: user_sessions::Model,
    pub user: users::Model,
}

/// 规范化邮箱：去空白、转小写
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// 认证服务
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    config: AuthConfig,
    app_base_url: String,
    sessions: SessionLedger,
    history: LoginHistory,
    two_factor: TwoFactorGate,
    challenges: ChallengeSigner,
    email: Arc<EmailClient>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &AuthConfig,
        app_base_url: &str,
        email: Arc<EmailClient>,
    ) -> Self {
        Self {
            sessions: SessionLedger::new(db.clone(), config.session_ttl_days),
            history: LoginHistory::new(db.clone()),
            two_factor: TwoFactorGate::new(db.clone(), &config.totp_issuer),
            challenges: ChallengeSigner::new(
                config.challenge_secret.as_deref(),
                config.two_factor_challenge_ttl_secs,
            ),
            db,
            config: config.clone(),
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
            email,
        }
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionLedger {
        &self.sessions
    }

    #[must_use]
    pub const fn history(&self) -> &LoginHistory {
        &self.history
    }

    #[must_use]
    pub const fn two_factor(&self) -> &TwoFactorGate {
        &self.two_factor
    }

    /// 注册新用户并直接登录
    pub async fn register(&self, request: RegisterRequest, client: &ClientInfo) -> Result<LoginOutcome> {
        let email = normalize_email(&request.email);
        ensure_valid!(
            email.len() >= 3 && email.contains('@'),
            "Invalid email address"
        );
        validate_password(&request.password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let now = Utc::now().naive_utc();
        let verification_token = generate_token();
        let user = users::ActiveModel {
            email: Set(email.clone()),
            name: Set(request
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())),
            password_hash: Set(hash_password(&request.password, self.config.bcrypt_cost)?),
            is_admin: Set(false),
            email_verified: Set(false),
            email_verification_token: Set(Some(hash_token(&verification_token))),
            subscription_tier: Set(Tier::Free.as_str().to_string()),
            two_factor_enabled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "user_registered",
            &format!("Registered user {}", user.id)
        );

        let link = format!("{}/verify-email?token={verification_token}", self.app_base_url);
        if let Err(e) = self.email.send_verification(&user.email, &link).await {
            lwarn!(
                "system",
                LogStage::ExternalApi,
                LogComponent::Email,
                "verification_email_failed",
                &format!("Failed to send verification email to user {}: {e}", user.id)
            );
        }

        self.complete_login(user, None, client).await
    }

    /// 密码登录；启用双因素的用户返回挑战令牌
    pub async fn login(&self, email: &str, password: &str, client: &ClientInfo) -> Result<LoginOutcome> {
        let Some(user) = self.find_by_email(&normalize_email(email)).await? else {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Auth,
                "login_unknown_email",
                "Login attempt for unknown email"
            );
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(password, &user.password_hash) {
            self.history.log_attempt(LoginAttempt::failed(
                user.id,
                LoginMethod::Password,
                client,
                "invalid_password",
            ));
            return Err(AuthError::InvalidCredentials.into());
        }

        if user.two_factor_enabled && user.two_factor_secret.is_some() {
            let challenge = self.challenges.issue(user.id, Utc::now().timestamp())?;
            return Ok(LoginOutcome::TwoFactorRequired { challenge });
        }

        self.complete_login(user, Some(LoginMethod::Password), client).await
    }

    /// 双因素登录第二步
    pub async fn verify_two_factor_login(
        &self,
        challenge: &str,
        code: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome> {
        let user_id = self.challenges.verify(challenge, Utc::now().timestamp())?;
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::ChallengeInvalid)?;

        let Some(secret) = user.two_factor_secret.as_deref().filter(|_| user.two_factor_enabled) else {
            return Err(AuthError::TwoFactorNotConfigured.into());
        };

        if !TwoFactorGate::verify(code, secret) {
            self.history.log_attempt(LoginAttempt::failed(
                user.id,
                LoginMethod::TwoFactor,
                client,
                "invalid_code",
            ));
            return Err(AuthError::InvalidTwoFactorCode.into());
        }

        self.complete_login(user, Some(LoginMethod::TwoFactor), client).await
    }

    async fn complete_login(
        &self,
        user: users::Model,
        method: Option<LoginMethod>,
        client: &ClientInfo,
    ) -> Result<LoginOutcome> {
        let session_token = self.sessions.create_session(user.id, client).await?;

        let now = Utc::now().naive_utc();
        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(now));
        let user = active.update(self.db.as_ref()).await?;

        if let Some(method) = method {
            self.history
                .log_attempt(LoginAttempt::succeeded(user.id, method, client));
        }

        Ok(LoginOutcome::Authenticated {
            session_token,
            user: UserProfile::from(&user),
        })
    }

    /// 登出当前会话
    pub async fn logout(&self, session_token: &str) -> Result<()> {
        self.sessions.revoke_session(session_token).await?;
        Ok(())
    }

    /// 根据会话令牌解析用户；未知、过期或用户已不存在时返回 `None`
    pub async fn authenticate(&self, session_token: &str) -> Result<Option<AuthenticatedSession>> {
        let Some(session) = self.sessions.validate(session_token).await? else {
            return Ok(None);
        };
        Ok(self
            .find_by_id(session.user_id)
            .await?
            .map(|user| AuthenticatedSession { session, user }))
    }

    /// 当前用户资料
    pub async fn me(&self, user_id: i32) -> Result<UserProfile> {
        self.find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// 请求密码重置。邮箱是否存在对外不可区分，始终成功
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Some(token) = self.issue_password_reset(email).await? else {
            return Ok(());
        };
        let email = normalize_email(email);
        let link = format!("{}/reset-password?token={token}", self.app_base_url);
        if let Err(e) = self
            .email
            .send_password_reset(&email, &link, self.config.password_reset_ttl_minutes)
            .await
        {
            lwarn!(
                "system",
                LogStage::ExternalApi,
                LogComponent::Email,
                "reset_email_failed",
                &format!("Failed to send password reset email: {e}")
            );
        }
        Ok(())
    }

    /// 为用户签发新的重置令牌（覆盖旧令牌），返回明文令牌；用户不存在返回 `None`
    pub async fn issue_password_reset(&self, email: &str) -> Result<Option<String>> {
        let Some(user) = self.find_by_email(&normalize_email(email)).await? else {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Auth,
                "reset_unknown_email",
                "Password reset requested for unknown email"
            );
            return Ok(None);
        };

        let token = generate_token();
        let now = Utc::now().naive_utc();
        let user_id = user.id;
        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(Some(hash_token(&token)));
        active.password_reset_expires =
            Set(Some(now + Duration::minutes(self.config.password_reset_ttl_minutes)));
        active.updated_at = Set(now);
        active.update(self.db.as_ref()).await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "password_reset_issued",
            &format!("Issued password reset token for user {user_id}")
        );
        Ok(Some(token))
    }

    /// 使用重置令牌设置新密码；成功后令牌失效并撤销该用户全部会话
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let now = Utc::now().naive_utc();
        let user = users::Entity::find()
            .filter(users::Column::PasswordResetToken.eq(hash_token(token.trim())))
            .filter(users::Column::PasswordResetExpires.gt(now))
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let user_id = user.id;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password, self.config.bcrypt_cost)?);
        active.password_reset_token = Set(None);
        active.password_reset_expires = Set(None);
        active.updated_at = Set(now);
        active.update(self.db.as_ref()).await?;

        let revoked = self.sessions.revoke_all_sessions(user_id).await?;
        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "password_reset",
            &format!("Password reset for user {user_id}, revoked {revoked} sessions")
        );
        Ok(())
    }

    /// 校验邮箱验证令牌
    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let user = users::Entity::find()
            .filter(users::Column::EmailVerificationToken.eq(hash_token(token.trim())))
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let mut active: users::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.email_verification_token = Set(None);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    /// 生成双因素密钥（尚未保存）
    pub fn begin_two_factor_setup(&self, user: &users::Model) -> Result<TwoFactorSetup> {
        self.two_factor.generate_secret(&user.email)
    }

    /// 用户提交密钥和当前验证码后启用双因素认证
    pub async fn enable_two_factor(&self, user_id: i32, secret: &str, code: &str) -> Result<()> {
        if !TwoFactorGate::verify(code, secret) {
            return Err(AuthError::InvalidTwoFactorCode.into());
        }
        self.two_factor.enable(user_id, secret.trim()).await
    }

    /// 凭当前验证码停用双因素认证
    pub async fn disable_two_factor(&self, user: &users::Model, code: &str) -> Result<()> {
        let Some(secret) = user.two_factor_secret.as_deref().filter(|_| user.two_factor_enabled) else {
            return Err(AuthError::TwoFactorNotConfigured.into());
        };
        if !TwoFactorGate::verify(code, secret) {
            return Err(AuthError::InvalidTwoFactorCode.into());
        }
        self.two_factor.disable(user.id).await
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<users::Model>> {
        Ok(users::Entity::find_by_id(user_id).one(self.db.as_ref()).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?)
    }
}
