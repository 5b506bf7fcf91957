//! # 路由配置
//!
//! 定义所有API路由和路由组织

use axum::Router;
use axum::routing::{delete, get, post};

use super::handlers::{account, admin, auth, subscription, webhook};
use super::middleware::require_session;
use super::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .merge(protected_auth_routes())
        .merge(account_routes())
        .merge(protected_subscription_routes())
        .merge(admin_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        // Stripe webhook，始终返回 200
        .route("/stripe/webhook", post(webhook::stripe_webhook))
        .merge(public_auth_routes())
        .merge(public_subscription_routes())
        .merge(protected)
        .with_state(state)
}

/// 无需登录的认证路由
fn public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/verify-two-factor-login",
            post(auth::verify_two_factor_login),
        )
        .route(
            "/auth/request-password-reset",
            post(auth::request_password_reset),
        )
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/verify-email", post(auth::verify_email))
}

/// 需要登录的认证路由
fn protected_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

/// 账户：会话、双因素、登录历史
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/sessions", get(account::list_sessions))
        .route("/account/sessions/{id}", delete(account::revoke_session))
        .route(
            "/account/sessions/revoke-others",
            post(account::revoke_other_sessions),
        )
        .route("/account/two-factor/setup", post(account::two_factor_setup))
        .route("/account/two-factor/enable", post(account::two_factor_enable))
        .route(
            "/account/two-factor/disable",
            post(account::two_factor_disable),
        )
        .route("/account/login-history", get(account::login_history))
}

/// 公开的订阅信息
fn public_subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscription/tiers", get(subscription::list_tiers))
        .route(
            "/subscription/features/{feature}",
            get(subscription::check_feature),
        )
}

fn protected_subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscription/access", get(subscription::get_access))
        .route("/subscription/checkout", post(subscription::create_checkout))
}

/// 管理员路由
fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/seed-products", post(admin::seed_products))
}
