//! # Stripe webhook 验签与事件解析
//!
//! 签名头格式 `t=<unix>,v1=<hex>[,v1=<hex>...]`，签名为
//! `HMAC-SHA256(secret, "{t}.{payload}")`。比较使用常量时间。

use chrono::{DateTime, NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::error::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Stripe 签名请求头
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// 默认允许的时间戳偏差（秒）
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// 解析后的签名头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

/// 解析 `Stripe-Signature` 头，忽略 v0 等其他方案
pub fn parse_signature_header(header: &str) -> Result<SignatureHeader, BillingError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    BillingError::MalformedSignature(format!("invalid timestamp '{value}'"))
                })?);
            }
            "v1" => {
                // 无法解码的签名直接跳过，其余签名仍可匹配
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| BillingError::MalformedSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(BillingError::MalformedSignature("no v1 signature".into()));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, BillingError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::MissingWebhookSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// 计算签名（hex），用于生成测试签名头
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, BillingError> {
    Ok(hex::encode(signing_mac(secret, timestamp, payload)?.finalize().into_bytes()))
}

/// 校验签名，成功返回签名时间戳
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> Result<i64, BillingError> {
    if secret.is_empty() {
        return Err(BillingError::MissingWebhookSecret);
    }

    let parsed = parse_signature_header(header)?;
    let mac = signing_mac(secret, parsed.timestamp, payload)?;

    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(BillingError::SignatureMismatch);
    }

    let age_secs = now_unix - parsed.timestamp;
    if age_secs.abs() > tolerance_secs {
        return Err(BillingError::TimestampOutsideTolerance { age_secs });
    }

    Ok(parsed.timestamp)
}

/// Stripe 事件信封
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// 验签后解析事件
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<StripeEvent, BillingError> {
    verify_signature(payload, header, secret, tolerance_secs, Utc::now().timestamp())?;
    serde_json::from_slice(payload).map_err(|e| BillingError::MalformedEvent(e.to_string()))
}

/// 对账关心的账单事件；字段缺失时保留为 `None`，由对账器决定跳过
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    CheckoutCompleted {
        user_id: Option<i32>,
        tier: Option<String>,
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    SubscriptionUpdated {
        user_id: Option<i32>,
        status: Option<String>,
        cancel_at: Option<NaiveDateTime>,
    },
    SubscriptionDeleted {
        user_id: Option<i32>,
    },
    InvoicePaymentFailed {
        subscription_id: Option<String>,
    },
    Unhandled {
        event_type: String,
    },
}

impl BillingEvent {
    pub const CHECKOUT_COMPLETED: &'static str = "checkout.session.completed";
    pub const SUBSCRIPTION_UPDATED: &'static str = "customer.subscription.updated";
    pub const SUBSCRIPTION_DELETED: &'static str = "customer.subscription.deleted";
    pub const INVOICE_PAYMENT_FAILED: &'static str = "invoice.payment_failed";

    /// 从 Stripe 事件提取对账字段
    #[must_use]
    pub fn from_stripe_event(event: &StripeEvent) -> Self {
        Self::from_parts(&event.event_type, &event.data.object)
    }

    #[must_use]
    pub fn from_parts(event_type: &str, object: &Value) -> Self {
        match event_type {
            Self::CHECKOUT_COMPLETED => Self::CheckoutCompleted {
                user_id: metadata_user_id(object).or_else(|| {
                    object
                        .get("client_reference_id")
                        .and_then(Value::as_str)
                        .and_then(|id| id.trim().parse().ok())
                }),
                tier: metadata_str(object, "tier"),
                subscription_id: expandable_id(object.get("subscription")),
                customer_id: expandable_id(object.get("customer")),
            },
            Self::SUBSCRIPTION_UPDATED => Self::SubscriptionUpdated {
                user_id: metadata_user_id(object),
                status: object
                    .get("status")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                cancel_at: object
                    .get("cancel_at")
                    .and_then(Value::as_i64)
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|at| at.naive_utc()),
            },
            Self::SUBSCRIPTION_DELETED => Self::SubscriptionDeleted {
                user_id: metadata_user_id(object),
            },
            Self::INVOICE_PAYMENT_FAILED => Self::InvoicePaymentFailed {
                subscription_id: expandable_id(object.get("subscription")),
            },
            other => Self::Unhandled {
                event_type: other.to_string(),
            },
        }
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutCompleted { .. } => Self::CHECKOUT_COMPLETED,
            Self::SubscriptionUpdated { .. } => Self::SUBSCRIPTION_UPDATED,
            Self::SubscriptionDeleted { .. } => Self::SUBSCRIPTION_DELETED,
            Self::InvoicePaymentFailed { .. } => Self::INVOICE_PAYMENT_FAILED,
            Self::Unhandled { event_type } => event_type,
        }
    }
}

fn metadata_str(object: &Value, key: &str) -> Option<String> {
    object
        .get("metadata")
        .and_then(|metadata| metadata.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `metadata.userId` 既可能是字符串也可能是数字
fn metadata_user_id(object: &Value) -> Option<i32> {
    let raw = object.get("metadata")?.get("userId")?;
    match raw {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}

/// Stripe 的可展开字段：字符串 ID 或带 `id` 的对象
fn expandable_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
