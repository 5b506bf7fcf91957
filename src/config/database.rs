//! # 数据库配置

use crate::error::{AppError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/house33.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if self.is_sqlite() && !self.is_memory_database() {
            let path_str = self
                .url
                .strip_prefix("sqlite://")
                .or_else(|| self.url.strip_prefix("sqlite:"))
                .unwrap_or(&self.url);
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            let db_path = Path::new(path_str);

            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::config_with_source(
                            format!("无法创建数据库目录: {}", parent.display()),
                            e,
                        )
                    })?;

                    linfo!(
                        "system",
                        LogStage::Startup,
                        LogComponent::Database,
                        "create_db_dir",
                        &format!("创建数据库目录: {}", parent.display())
                    );
                }
            }
        }

        Ok(())
    }

    /// 获取准备好的数据库连接字符串；SQLite 文件库自动追加 `mode=rwc`
    pub fn get_connection_url(&self) -> Result<String> {
        self.ensure_database_path()?;
        if self.is_sqlite() && !self.is_memory_database() && !self.url.contains("mode=") {
            let separator = if self.url.contains('?') { '&' } else { '?' };
            return Ok(format!("{}{separator}mode=rwc", self.url));
        }
        Ok(self.url.clone())
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}
