//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的服务实例，便于在测试中注入替身配置。

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::billing::StripeClient;
use crate::config::AppConfig;
use crate::email::EmailClient;
use crate::error::Result;
use crate::subscription::SubscriptionReconciler;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthService>,
    pub stripe: Arc<StripeClient>,
    pub email: Arc<EmailClient>,
    pub reconciler: Arc<SubscriptionReconciler>,
}

impl AppContext {
    /// 根据配置与数据库连接组装全部服务
    pub fn build(config: Arc<AppConfig>, db: Arc<DatabaseConnection>) -> Result<Self> {
        let email = Arc::new(EmailClient::new(&config.email)?);
        let stripe = Arc::new(StripeClient::new(
            &config.billing,
            &config.server.app_base_url,
        )?);
        let auth = Arc::new(AuthService::new(
            db.clone(),
            &config.auth,
            &config.server.app_base_url,
            email.clone(),
        ));
        let reconciler = Arc::new(SubscriptionReconciler::new(db.clone()));

        Ok(Self {
            config,
            db,
            auth,
            stripe,
            email,
            reconciler,
        })
    }
}
