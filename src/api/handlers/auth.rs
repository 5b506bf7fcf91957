//! # 认证处理器
//!
//! 注册、登录、双因素第二步、登出、密码重置与邮箱验证

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;

use super::{fail, set_session_cookie};
use crate::api::middleware::{AuthContext, RequestId};
use crate::api::response;
use crate::api::server::AppState;
use crate::auth::{ClientInfo, LoginOutcome, RegisterRequest};
use crate::logging::LogComponent;

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 双因素登录第二步
#[derive(Debug, Deserialize)]
pub struct TwoFactorLoginRequest {
    pub challenge: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// 登录成功时附带会话 Cookie
fn outcome_response(state: &AppState, outcome: &LoginOutcome) -> Response {
    let response = response::success(outcome);
    match outcome {
        LoginOutcome::Authenticated { session_token, .. } => {
            let max_age = state.config.auth.session_ttl_days * 24 * 60 * 60;
            set_session_cookie(response, session_token, max_age)
        }
        LoginOutcome::TwoFactorRequired { .. } => response,
    }
}

/// 注册新账户并直接登录
pub async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(client): Extension<ClientInfo>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    match state.auth.register(request, &client).await {
        Ok(outcome) => outcome_response(&state, &outcome),
        Err(err) => fail(&request_id, LogComponent::Auth, "register", "注册失败", err),
    }
}

/// 邮箱密码登录
pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(client): Extension<ClientInfo>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state.auth.login(&request.email, &request.password, &client).await {
        Ok(outcome) => outcome_response(&state, &outcome),
        Err(err) => fail(&request_id, LogComponent::Auth, "login", "登录失败", err),
    }
}

/// 用挑战令牌与 TOTP 验证码完成登录
pub async fn verify_two_factor_login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(client): Extension<ClientInfo>,
    Json(request): Json<TwoFactorLoginRequest>,
) -> Response {
    match state
        .auth
        .verify_two_factor_login(&request.challenge, &request.code, &client)
        .await
    {
        Ok(outcome) => outcome_response(&state, &outcome),
        Err(err) => fail(
            &request_id,
            LogComponent::TwoFactor,
            "verify_two_factor_login",
            "双因素登录失败",
            err,
        ),
    }
}

/// 注销当前会话
pub async fn logout(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match state.auth.logout(&auth.session_token).await {
        Ok(()) => set_session_cookie(response::success_without_data("Logged out"), "", 0),
        Err(err) => fail(&request_id, LogComponent::Session, "logout", "注销失败", err),
    }
}

/// 当前用户资料
pub async fn me(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match state.auth.me(auth.user_id()).await {
        Ok(profile) => response::success(profile),
        Err(err) => fail(&request_id, LogComponent::Auth, "me", "获取用户资料失败", err),
    }
}

/// 申请密码重置。邮箱是否存在都返回同样的结果
pub async fn request_password_reset(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PasswordResetRequest>,
) -> Response {
    match state.auth.request_password_reset(&request.email).await {
        Ok(()) => response::success_without_data(
            "If the email is registered, a reset link has been sent",
        ),
        Err(err) => fail(
            &request_id,
            LogComponent::Auth,
            "request_password_reset",
            "申请密码重置失败",
            err,
        ),
    }
}

/// 使用重置令牌设置新密码
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ResetPasswordRequest>,
) -> Response {
    match state.auth.reset_password(&request.token, &request.password).await {
        Ok(()) => response::success_without_data("Password has been reset"),
        Err(err) => fail(
            &request_id,
            LogComponent::Auth,
            "reset_password",
            "重置密码失败",
            err,
        ),
    }
}

pub async fn verify_email(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<VerifyEmailRequest>,
) -> Response {
    match state.auth.verify_email(&request.token).await {
        Ok(()) => response::success_without_data("Email verified"),
        Err(err) => fail(
            &request_id,
            LogComponent::Auth,
            "verify_email",
            "邮箱验证失败",
            err,
        ),
    }
}
