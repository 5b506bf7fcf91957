//! # 管理员处理器

use axum::extract::{Extension, State};
use axum::response::Response;
use std::sync::Arc;

use super::fail;
use crate::api::middleware::{AuthContext, RequestId};
use crate::api::response;
use crate::api::server::AppState;
use crate::error::AuthError;
use crate::logging::LogComponent;

/// 在 Stripe 中为每个付费等级创建商品与月度价格
pub async fn seed_products(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(auth): Extension<Arc<AuthContext>>,
) -> Response {
    if !auth.user.is_admin {
        return response::app_error(AuthError::AdminRequired.into());
    }

    match state.stripe.seed_products().await {
        Ok(products) => response::success(products),
        Err(err) => fail(
            &request_id,
            LogComponent::Stripe,
            "seed_products",
            "初始化 Stripe 商品失败",
            err,
        ),
    }
}
