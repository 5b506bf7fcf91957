//! # The 33rd House 会员后端
//!
//! 等级订阅门控、Stripe webhook 对账、设备会话、登录历史与双因素认证

pub mod api;
pub mod app;
pub mod auth;
pub mod billing;
pub mod config;
pub mod database;
pub mod email;
pub mod error;
pub mod logging;
pub mod subscription;
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, Result};
