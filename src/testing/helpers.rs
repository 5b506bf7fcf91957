//! # 测试辅助函数
//!
//! 提供通用的测试工具和辅助函数

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::{Arc, Once};
use tracing::Level;

use crate::app::AppContext;
use crate::config::{AppConfig, DatabaseConfig};
use crate::error::Result;

static INIT: Once = Once::new();

/// 测试用 webhook 签名密钥
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// 测试用双因素挑战签名密钥
pub const TEST_CHALLENGE_SECRET: &str = "test-challenge-secret";

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建内存数据库连接并执行迁移
pub async fn create_test_db() -> std::result::Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// 测试配置：内存数据库、已知 webhook 密钥、低 bcrypt 成本
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    config.billing.stripe_webhook_secret = Some(TEST_WEBHOOK_SECRET.to_string());
    config.auth.bcrypt_cost = 4;
    config.auth.challenge_secret = Some(TEST_CHALLENGE_SECRET.to_string());
    config
}

/// 基于给定配置和全新内存数据库组装应用上下文
pub async fn create_test_context_with(config: AppConfig) -> Result<Arc<AppContext>> {
    init_test_env();
    let db = Arc::new(create_test_db().await?);
    Ok(Arc::new(AppContext::build(Arc::new(config), db)?))
}

/// 使用 [`test_config`] 组装应用上下文
pub async fn create_test_context() -> Result<Arc<AppContext>> {
    create_test_context_with(test_config()).await
}
