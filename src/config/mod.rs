//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖与校验

mod app_config;
mod database;
mod manager;

pub use app_config::{AppConfig, AuthConfig, BillingConfig, EmailConfig, ServerConfig};
pub use database::DatabaseConfig;
pub use manager::ConfigManager;
