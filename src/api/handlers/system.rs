//! # 系统处理器

use axum::response::Response;
use serde_json::json;

use crate::api::response;

/// 存活探测
pub async fn ping_handler() -> Response {
    response::success(json!({ "message": "pong" }))
}
