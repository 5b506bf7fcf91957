//! # Stripe webhook 处理器
//!
//! 无论验签与对账结果如何都以 200 应答，失败只进入告警日志。

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;

use crate::api::middleware::RequestId;
use crate::api::server::AppState;
use crate::subscription::webhook::SIGNATURE_HEADER;
use crate::subscription::{WebhookAck, handle_webhook};

pub async fn stripe_webhook(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookAck> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let billing = &state.config.billing;

    let ack = handle_webhook(
        &state.reconciler,
        &body,
        signature,
        billing.stripe_webhook_secret.as_deref(),
        billing.signature_tolerance_secs,
        &request_id,
    )
    .await;
    Json(ack)
}
