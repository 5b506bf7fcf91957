//! # 认证中间件
//!
//! 从 `Authorization: Bearer <token>` 或 `session_token` Cookie 中提取会话令牌，
//! 校验后把用户信息注入到请求扩展中。

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use entity::users;
use std::sync::Arc;

use super::request_id::RequestId;
use crate::api::response;
use crate::api::server::AppState;
use crate::error::{AuthError, Result};
use crate::logging::{LogComponent, LogStage, log_request_error};

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "session_token";

/// 包含认证用户信息的上下文
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: users::Model,
    pub session_token: String,
}

impl AuthContext {
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.user.id
    }
}

/// 提取会话令牌，Bearer 优先于 Cookie
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// 解析请求的登录态；无令牌或令牌无效返回 `None`
pub async fn resolve_auth(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthContext>> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    Ok(state
        .auth
        .authenticate(&token)
        .await?
        .map(|authenticated| AuthContext {
            user: authenticated.user,
            session_token: token,
        }))
}

/// Axum认证中间件
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);

    match resolve_auth(&state, request.headers()).await {
        Ok(Some(context)) => {
            request.extensions_mut().insert(Arc::new(context));
            next.run(request).await
        }
        Ok(None) => response::app_error(AuthError::NotAuthenticated.into()),
        Err(err) => {
            log_request_error(
                &request_id,
                LogStage::Authentication,
                LogComponent::Session,
                "resolve_session",
                "会话校验失败",
                &err,
            );
            response::app_error(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert(COOKIE, HeaderValue::from_static("session_token=fromcookie"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session_token=deadbeef; other=1"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_session_token(&headers), None);
    }
}
