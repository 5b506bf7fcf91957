//! # Stripe REST 客户端
//!
//! 只覆盖本服务用到的两类调用：创建订阅结账会话、初始化商品与价格目录。
//! 请求使用表单编码与 Bearer 认证，`api_base` 可配置以便测试。

use entity::users;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BillingConfig;
use crate::error::{AppError, BillingError, Result};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::subscription::Tier;

/// 结账会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// 初始化得到的商品与价格
#[derive(Debug, Clone, Serialize)]
pub struct SeededProduct {
    pub tier: Tier,
    pub product_id: String,
    pub price_id: String,
    pub unit_amount: u32,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe 客户端
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: Option<String>,
    app_base_url: String,
}

impl StripeClient {
    pub fn new(config: &BillingConfig, app_base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| AppError::config_with_source("创建 Stripe HTTP 客户端失败", e))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// 为用户创建某个付费等级的订阅结账会话
    pub async fn create_checkout_session(
        &self,
        user: &users::Model,
        tier: Tier,
    ) -> Result<CheckoutSession> {
        let price_id = tier
            .config()
            .stripe_price_id
            .ok_or_else(|| BillingError::TierNotPurchasable(tier.to_string()))?;

        let user_id = user.id.to_string();
        let success_url = format!(
            "{}/subscription/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.app_base_url
        );
        let cancel_url = format!("{}/pricing", self.app_base_url);

        let mut form: Vec<(&str, String)> = vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", user_id.clone()),
            ("metadata[userId]", user_id.clone()),
            ("metadata[tier]", tier.as_str().to_string()),
            ("subscription_data[metadata][userId]", user_id),
            ("subscription_data[metadata][tier]", tier.as_str().to_string()),
            ("allow_promotion_codes", "true".to_string()),
        ];
        match &user.stripe_customer_id {
            Some(customer) => form.push(("customer", customer.clone())),
            None => form.push(("customer_email", user.email.clone())),
        }

        let session: CheckoutSession = self.post_form("/v1/checkout/sessions", &form).await?;

        linfo!(
            "system",
            LogStage::ExternalApi,
            LogComponent::Stripe,
            "checkout_session_created",
            &format!("Created checkout session {} for user {}", session.id, user.id),
            tier = %tier
        );
        Ok(session)
    }

    /// 为每个付费等级创建一个商品和一个按月计费的价格
    pub async fn seed_products(&self) -> Result<Vec<SeededProduct>> {
        let mut seeded = Vec::new();

        for tier in Tier::ALL.into_iter().filter(|tier| tier.is_paid()) {
            let config = tier.config();

            let product: IdResponse = self
                .post_form(
                    "/v1/products",
                    &[
                        ("name", format!("The 33rd House {}", config.display_name)),
                        ("description", config.description.to_string()),
                        ("metadata[tier]", tier.as_str().to_string()),
                    ],
                )
                .await?;

            let price: IdResponse = self
                .post_form(
                    "/v1/prices",
                    &[
                        ("product", product.id.clone()),
                        ("unit_amount", config.monthly_price_cents.to_string()),
                        ("currency", "usd".to_string()),
                        ("recurring[interval]", "month".to_string()),
                        ("metadata[tier]", tier.as_str().to_string()),
                    ],
                )
                .await?;

            linfo!(
                "system",
                LogStage::ExternalApi,
                LogComponent::Stripe,
                "product_seeded",
                &format!("Seeded {tier}: product={} price={}", product.id, price.id)
            );

            seeded.push(SeededProduct {
                tier,
                product_id: product.id,
                price_id: price.id,
                unit_amount: config.monthly_price_cents,
            });
        }

        Ok(seeded)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T> {
        let secret_key = self.secret_key.as_deref().ok_or(BillingError::MissingSecretKey)?;

        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::billing_with_source(format!("Stripe 请求失败: {path}"), e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(BillingError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::billing_with_source(format!("Stripe 响应解析失败: {path}"), e))
    }
}
