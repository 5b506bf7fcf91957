//! # 订阅处理器
//!
//! 等级目录、功能门控查询、访问视图与结账会话

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::fail;
use crate::api::middleware::{AuthContext, RequestId, resolve_auth};
use crate::api::response;
use crate::api::server::AppState;
use crate::logging::LogComponent;
use crate::subscription::{SubscriptionAccess, TIER_TABLE, Tier, required_tier};
use crate::validation_error;

/// 功能检查结果
#[derive(Debug, Serialize)]
pub struct FeatureCheck {
    pub feature: String,
    pub allowed: bool,
    /// 未知功能为空
    pub required_tier: Option<Tier>,
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tier: String,
}

/// 全部等级及其价格、功能与限额
pub async fn list_tiers() -> Response {
    response::success(&TIER_TABLE)
}

/// 当前用户的订阅访问视图
pub async fn get_access(Extension(auth): Extension<Arc<AuthContext>>) -> Response {
    response::success(SubscriptionAccess::for_user(&auth.user))
}

/// 查询某个功能对当前调用方是否开放；未登录一律不开放
pub async fn check_feature(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(feature): Path<String>,
) -> Response {
    let access = match resolve_auth(&state, &headers).await {
        Ok(Some(auth)) => SubscriptionAccess::for_user(&auth.user),
        Ok(None) => SubscriptionAccess::unauthenticated(),
        Err(err) => {
            return fail(
                &request_id,
                LogComponent::Subscription,
                "check_feature",
                "解析会话失败",
                err,
            );
        }
    };

    response::success(FeatureCheck {
        allowed: access.can_access(&feature),
        required_tier: required_tier(&feature),
        authenticated: access.authenticated,
        feature,
    })
}

/// 为付费等级创建 Stripe 结账会话
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    let Some(tier) = Tier::parse(&request.tier) else {
        return response::app_error(validation_error!("Unknown tier '{}'", request.tier));
    };

    match state.stripe.create_checkout_session(&auth.user, tier).await {
        Ok(session) => response::success(session),
        Err(err) => fail(
            &request_id,
            LogComponent::Stripe,
            "create_checkout",
            "创建结账会话失败",
            err,
        ),
    }
}
