//! # 外发邮件
//!
//! 通过 Forge API 发送事务邮件：`POST {api_url}/v1/email/send`。
//! 未配置 API 地址或密钥时只记录警告并跳过，不影响调用方流程。

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// 邮件客户端
pub struct EmailClient {
    http: Client,
    api_url: Option<String>,
    api_key: Option<String>,
    from_address: String,
}

impl EmailClient {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::config_with_source("创建邮件 HTTP 客户端失败", e))?;

        Ok(Self {
            http,
            api_url: config
                .api_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }

    /// 发送邮件；未配置时返回 `Ok(false)`
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<bool> {
        let (Some(api_url), Some(api_key)) = (&self.api_url, &self.api_key) else {
            lwarn!(
                "system",
                LogStage::ExternalApi,
                LogComponent::Email,
                "email_skipped",
                &format!("Email API not configured, skipping '{subject}'")
            );
            return Ok(false);
        };

        let response = self
            .http
            .post(format!("{api_url}/v1/email/send"))
            .bearer_auth(api_key)
            .json(&SendEmailRequest {
                from: &self.from_address,
                to,
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| AppError::email_with_source("邮件服务请求失败", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::email(format!("邮件服务返回 {status}: {body}")));
        }

        linfo!(
            "system",
            LogStage::ExternalApi,
            LogComponent::Email,
            "email_sent",
            &format!("Sent '{subject}'")
        );
        Ok(true)
    }

    /// 密码重置邮件，`ttl_minutes` 为链接有效期
    pub async fn send_password_reset(
        &self,
        to: &str,
        reset_link: &str,
        ttl_minutes: i64,
    ) -> Result<bool> {
        let expiry = expiry_phrase(ttl_minutes);
        let html = format!(
            "<p>A password reset was requested for your account at The 33rd House.</p>\
             <p><a href=\"{reset_link}\">Reset your password</a>. This link expires in {expiry}.</p>\
             <p>If you did not request this, you can ignore this email.</p>"
        );
        self.send(to, "Reset your password", &html).await
    }

    /// 邮箱验证邮件
    pub async fn send_verification(&self, to: &str, verify_link: &str) -> Result<bool> {
        let html = format!(
            "<p>Welcome to The 33rd House.</p>\
             <p><a href=\"{verify_link}\">Verify your email address</a> to complete your registration.</p>"
        );
        self.send(to, "Verify your email", &html).await
    }
}

/// 有效期的可读描述，整小时按小时显示
fn expiry_phrase(minutes: i64) -> String {
    match minutes {
        1 => "1 minute".to_string(),
        60 => "one hour".to_string(),
        m if m > 0 && m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_phrase() {
        assert_eq!(expiry_phrase(60), "one hour");
        assert_eq!(expiry_phrase(120), "2 hours");
        assert_eq!(expiry_phrase(45), "45 minutes");
        assert_eq!(expiry_phrase(1), "1 minute");
    }

    #[tokio::test]
    async fn test_unconfigured_client_skips() {
        let client = EmailClient::new(&EmailConfig::default()).unwrap();
        assert!(!client.is_configured());
        assert!(!client.send("a@b.c", "subject", "<p>hi</p>").await.unwrap());
    }
}
