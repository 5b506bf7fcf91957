//! # 数据库模块
//!
//! 数据库连接和迁移管理

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{AppError, Context, Result};

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    // 对于SQLite数据库，同时确保数据库文件的目录存在
    let database_url = config.get_connection_url()?;
    // 非 SQLite 连接串可能含有密码
    let shown: String = if config.is_sqlite() {
        database_url.chars().take(50).collect()
    } else {
        "***".to_string()
    };
    info!("正在连接数据库: {}", shown);

    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .map_err(|e| AppError::database_with_source("数据库连接失败", e))?;

    info!("数据库连接成功");
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(AppError::database_with_source("数据库迁移失败", e))
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> Result<usize> {
    let pending = ::migration::Migrator::get_pending_migrations(db)
        .await
        .context("查询待执行迁移失败")?;

    if pending.is_empty() {
        info!("所有迁移都已应用");
    } else {
        warn!("有 {} 个待应用的迁移", pending.len());
    }

    Ok(pending.len())
}
