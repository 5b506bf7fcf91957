//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// Stripe 账单配置
    pub billing: BillingConfig,
    /// 外发邮件配置
    pub email: EmailConfig,
    /// 认证配置
    pub auth: AuthConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// API前缀
    pub api_prefix: String,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
    /// 前端站点地址，用于拼接邮件链接与结账回跳地址
    pub app_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: "/api".to_string(),
            cors_origins: vec!["*".to_string()],
            app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Stripe 账单配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// `STRIPE_SECRET_KEY`
    pub stripe_secret_key: Option<String>,
    /// `STRIPE_WEBHOOK_SECRET`
    pub stripe_webhook_secret: Option<String>,
    /// Stripe REST API 地址
    pub api_base: String,
    /// webhook 签名时间戳允许的偏差（秒）
    pub signature_tolerance_secs: i64,
    /// 请求超时时间（秒）
    pub request_timeout: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            api_base: "https://api.stripe.com".to_string(),
            signature_tolerance_secs: 300,
            request_timeout: 30,
        }
    }
}

/// 外发邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// `VITE_FRONTEND_FORGE_API_URL`
    pub api_url: Option<String>,
    /// `FORGE_API_KEY`
    pub api_key: Option<String>,
    /// 发件人
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            from_address: "The 33rd House <noreply@the33rdhouse.com>".to_string(),
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 会话有效期（天）
    pub session_ttl_days: i64,
    /// 密码重置令牌有效期（分钟）
    pub password_reset_ttl_minutes: i64,
    /// 双因素登录挑战有效期（秒）
    pub two_factor_challenge_ttl_secs: i64,
    /// TOTP 发行方名称
    pub totp_issuer: String,
    /// 双因素挑战签名密钥，未配置时启动时随机生成
    pub challenge_secret: Option<String>,
    /// bcrypt 成本因子
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: 30,
            password_reset_ttl_minutes: 60,
            two_factor_challenge_ttl_secs: 300,
            totp_issuer: "The 33rd House".to_string(),
            challenge_secret: None,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.auth.session_ttl_days <= 0 {
            return Err("auth.session_ttl_days must be greater than 0".to_string());
        }
        if self.auth.password_reset_ttl_minutes <= 0 {
            return Err("auth.password_reset_ttl_minutes must be greater than 0".to_string());
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err("auth.bcrypt_cost must be between 4 and 31".to_string());
        }
        if self.billing.signature_tolerance_secs <= 0 {
            return Err("billing.signature_tolerance_secs must be greater than 0".to_string());
        }
        if let Some(api_url) = &self.email.api_url {
            url::Url::parse(api_url).map_err(|e| format!("email.api_url is not a valid URL: {e}"))?;
        }
        url::Url::parse(&self.billing.api_base)
            .map_err(|e| format!("billing.api_base is not a valid URL: {e}"))?;
        Ok(())
    }

    /// 获取监听地址
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}
