//! # 订阅模块
//!
//! 等级表、功能门控、访问视图，以及 Stripe webhook 到用户订阅状态的对账。

pub mod access;
pub mod features;
pub mod reconciler;
pub mod tiers;
pub mod webhook;

pub use access::{LimitKind, SubscriptionAccess};
pub use features::{Feature, can_access, required_tier};
pub use reconciler::{ReconcileOutcome, SubscriptionReconciler};
pub use tiers::{TIER_TABLE, Tier, TierConfig, TierLimits, tier_at_least, tier_for_price_id, tier_level};
pub use webhook::{BillingEvent, StripeEvent};

use serde::Serialize;

use crate::error::BillingError;
use crate::{lerror, linfo};
use crate::logging::{LogComponent, LogStage};

/// webhook 应答体。HTTP 状态始终为 200，失败信息只写在 `error` 里
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub verified: bool,
    /// 事件是否通过验签并进入对账
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            verified: true,
            received: false,
            event_id: None,
            event_type: None,
            outcome: None,
            error: Some(error.into()),
        }
    }
}

/// 处理一次 webhook 投递。
///
/// 缺少密钥、缺少签名头、验签失败都只记录告警日志并返回应答，从不向调用方报错，
/// 以免 Stripe 反复重试。
pub async fn handle_webhook(
    reconciler: &SubscriptionReconciler,
    payload: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
    tolerance_secs: i64,
    request_id: &str,
) -> WebhookAck {
    let verification = match (secret.filter(|s| !s.is_empty()), signature) {
        (None, _) => Err(BillingError::MissingWebhookSecret),
        (Some(_), None) => Err(BillingError::MissingSignature),
        (Some(secret), Some(signature)) => {
            webhook::construct_event(payload, signature, secret, tolerance_secs)
        }
    };

    let event = match verification {
        Ok(event) => event,
        Err(err) => {
            lerror!(
                request_id,
                LogStage::Webhook,
                LogComponent::Stripe,
                "webhook_verification_failed",
                &format!("Stripe webhook not processed: {err}"),
                alert = err.is_verification_failure(),
                payload_bytes = payload.len()
            );
            return WebhookAck::rejected(err.to_string());
        }
    };

    linfo!(
        request_id,
        LogStage::Webhook,
        LogComponent::Stripe,
        "webhook_received",
        &format!("Received Stripe event {} ({})", event.id, event.event_type),
        event_created = ?event.created
    );

    let billing_event = BillingEvent::from_stripe_event(&event);
    let mut ack = WebhookAck {
        verified: true,
        received: true,
        event_id: Some(event.id.clone()),
        event_type: Some(event.event_type.clone()),
        outcome: None,
        error: None,
    };

    match reconciler.apply(&billing_event, request_id).await {
        Ok(outcome) => {
            ack.outcome = Some(outcome.to_string());
        }
        Err(err) => {
            lerror!(
                request_id,
                LogStage::Webhook,
                LogComponent::Subscription,
                "webhook_reconcile_failed",
                &format!("Failed to apply {} ({}): {err:?}", event.event_type, event.id),
                event_created = ?event.created
            );
            ack.error = Some(err.public_message());
        }
    }

    ack
}
