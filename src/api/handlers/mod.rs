//! # HTTP 处理器

pub mod account;
pub mod admin;
pub mod auth;
pub mod subscription;
pub mod system;
pub mod webhook;

use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::Response;

use super::middleware::SESSION_COOKIE;
use super::response;
use crate::error::AppError;
use crate::logging::{LogComponent, LogStage, log_request_error};

/// 记录失败并转换为标准错误响应
fn fail(
    request_id: &str,
    component: LogComponent,
    operation: &str,
    description: &str,
    err: AppError,
) -> Response {
    log_request_error(
        request_id,
        LogStage::RequestStart,
        component,
        operation,
        description,
        &err,
    );
    response::app_error(err)
}

/// 写入会话 Cookie；`max_age_secs` 为 0 时清除
fn set_session_cookie(mut response: Response, token: &str, max_age_secs: i64) -> Response {
    let cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}
