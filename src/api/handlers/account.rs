//! # 账户处理器
//!
//! 设备会话管理、双因素认证开关与登录历史

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::response::Response;
use chrono::NaiveDateTime;
use entity::user_sessions;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::fail;
use crate::api::middleware::{AuthContext, RequestId};
use crate::api::response;
use crate::api::server::AppState;
use crate::error::AppError;
use crate::logging::LogComponent;

const DEFAULT_HISTORY_LIMIT: u64 = 50;
const MAX_HISTORY_LIMIT: u64 = 200;

/// 设备会话视图，不含会话令牌
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: i32,
    pub device_info: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub last_activity: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    /// 是否为发起本次请求的会话
    pub is_current: bool,
}

impl SessionView {
    fn from_model(session: user_sessions::Model, current_token: &str) -> Self {
        let is_current = session.session_token == current_token;
        Self {
            id: session.id,
            device_info: session.device_info,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            last_activity: session.last_activity,
            created_at: session.created_at,
            expires_at: session.expires_at,
            is_current,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnableTwoFactorRequest {
    pub secret: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct DisableTwoFactorRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u64>,
}

/// 列出当前用户未过期的会话，按最近活动倒序
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match state.auth.sessions().list_active_sessions(auth.user_id()).await {
        Ok(sessions) => {
            let views: Vec<SessionView> = sessions
                .into_iter()
                .map(|session| SessionView::from_model(session, &auth.session_token))
                .collect();
            response::success(views)
        }
        Err(err) => fail(
            &request_id,
            LogComponent::Session,
            "list_sessions",
            "获取会话列表失败",
            err,
        ),
    }
}

/// 按 id 注销当前用户的某个会话
pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(session_id): Path<i32>,
) -> Response {
    match state
        .auth
        .sessions()
        .revoke_user_session_by_id(auth.user_id(), session_id)
        .await
    {
        Ok(0) => response::app_error(AppError::not_found("session", session_id.to_string())),
        Ok(revoked) => response::success(json!({ "revoked": revoked })),
        Err(err) => fail(
            &request_id,
            LogComponent::Session,
            "revoke_session",
            "注销会话失败",
            err,
        ),
    }
}

/// 注销除当前会话外的所有会话
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    match state
        .auth
        .sessions()
        .revoke_all_other_sessions(auth.user_id(), &auth.session_token)
        .await
    {
        Ok(revoked) => response::success(json!({ "revoked": revoked })),
        Err(err) => fail(
            &request_id,
            LogComponent::Session,
            "revoke_other_sessions",
            "注销其他会话失败",
            err,
        ),
    }
}

/// 生成新的 TOTP 密钥，启用前不落库
pub async fn two_factor_setup(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if auth.user.two_factor_enabled {
        return response::app_error(AppError::conflict("two_factor", "enabled"));
    }
    match state.auth.begin_two_factor_setup(&auth.user) {
        Ok(setup) => response::success(setup),
        Err(err) => fail(
            &request_id,
            LogComponent::TwoFactor,
            "two_factor_setup",
            "生成双因素密钥失败",
            err,
        ),
    }
}

pub async fn two_factor_enable(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Json(request): Json<EnableTwoFactorRequest>,
) -> Response {
    match state
        .auth
        .enable_two_factor(auth.user_id(), &request.secret, &request.code)
        .await
    {
        Ok(()) => response::success_without_data("Two-factor authentication enabled"),
        Err(err) => fail(
            &request_id,
            LogComponent::TwoFactor,
            "two_factor_enable",
            "启用双因素认证失败",
            err,
        ),
    }
}

pub async fn two_factor_disable(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Json(request): Json<DisableTwoFactorRequest>,
) -> Response {
    match state.auth.disable_two_factor(&auth.user, &request.code).await {
        Ok(()) => response::success_without_data("Two-factor authentication disabled"),
        Err(err) => fail(
            &request_id,
            LogComponent::TwoFactor,
            "two_factor_disable",
            "停用双因素认证失败",
            err,
        ),
    }
}

/// 最近的登录记录，默认 50 条
pub async fn login_history(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    match state.auth.history().recent(auth.user_id(), limit).await {
        Ok(entries) => response::success(entries),
        Err(err) => fail(
            &request_id,
            LogComponent::LoginHistory,
            "login_history",
            "获取登录历史失败",
            err,
        ),
    }
}
