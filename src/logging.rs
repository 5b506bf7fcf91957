//! # 日志配置模块
//!
//! 提供结构化日志宏（`linfo!` / `lwarn!` / `lerror!` / `ldebug!`）与日志系统初始化。
//! 每条日志都带有 `request_id`、`stage`、`component`、`operation` 四个字段，便于检索。

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{AppError, ErrorCategory};

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    RequestStart,
    Authentication,
    Webhook,
    Reconcile,
    Db,
    ExternalApi,
    BackgroundTask,
    Internal,
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::RequestStart => "request_start",
            Self::Authentication => "authentication",
            Self::Webhook => "webhook",
            Self::Reconcile => "reconcile",
            Self::Db => "db",
            Self::ExternalApi => "external_api",
            Self::BackgroundTask => "background_task",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    Database,
    ServerSetup,
    Auth,
    Session,
    LoginHistory,
    TwoFactor,
    Email,
    Stripe,
    Subscription,
    Api,
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::ServerSetup => "server_setup",
            Self::Auth => "auth",
            Self::Session => "session",
            Self::LoginHistory => "login_history",
            Self::TwoFactor => "two_factor",
            Self::Email => "email",
            Self::Stripe => "stripe",
            Self::Subscription => "subscription",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// 结构化 info 日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 记录 HTTP 处理器中的错误：客户端错误记 warn，服务端错误记 error
pub fn log_request_error(
    request_id: &str,
    stage: LogStage,
    component: LogComponent,
    operation: &str,
    description: &str,
    err: &AppError,
) {
    match err.category() {
        ErrorCategory::Client => {
            lwarn!(request_id, stage, component, operation, &format!("{description}: {err}"));
        }
        ErrorCategory::Server => {
            lerror!(request_id, stage, component, operation, &format!("{description}: {err:?}"));
        }
    }
}

/// 初始化日志系统
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    // 默认关闭 SQL 语句级日志
    let default_filter = format!(
        "{level},house_membership=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn"
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();

    if env::var("RUST_LOG").is_ok_and(|v| v.contains("sqlx::query=info") || v.contains("sqlx::query=debug")) {
        tracing::info!("🔍 SQLx database query logging enabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_component_display() {
        assert_eq!(LogStage::Webhook.to_string(), "webhook");
        assert_eq!(LogStage::ExternalApi.to_string(), "external_api");
        assert_eq!(LogComponent::TwoFactor.to_string(), "two_factor");
        assert_eq!(LogComponent::LoginHistory.to_string(), "login_history");
    }

    #[test]
    fn test_macros_accept_extra_fields() {
        linfo!("system", LogStage::Startup, LogComponent::Main, "macro_check", "plain");
        lwarn!(
            "system",
            LogStage::Webhook,
            LogComponent::Stripe,
            "macro_check",
            &format!("with fields {}", 1),
            alert = true,
            event_type = "invoice.payment_failed"
        );
    }
}
