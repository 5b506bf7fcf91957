//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::ErrorCategory;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证错误
    #[error("认证错误: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 权限不足
    #[error("权限错误: {message}")]
    Permission { message: String },

    /// 输入校验错误
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 资源未找到（过期令牌同样归入此类）
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 资源冲突
    #[error("资源冲突: {resource_type} {identifier}")]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    /// 账单服务（Stripe）错误
    #[error("账单错误: {message}")]
    Billing {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 邮件服务错误
    #[error("邮件服务错误: {message}")]
    Email {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Auth { .. } => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            Self::Permission { .. } => (StatusCode::FORBIDDEN, "PERMISSION_ERROR"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "RESOURCE_CONFLICT"),
            Self::Billing { .. } => (StatusCode::BAD_GATEWAY, "BILLING_ERROR"),
            Self::Email { .. } => (StatusCode::BAD_GATEWAY, "EMAIL_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 错误归类，用于日志级别选择
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.to_http_response_parts().0.is_client_error() {
            ErrorCategory::Client
        } else {
            ErrorCategory::Server
        }
    }

    /// 面向客户端的消息：服务端错误不暴露内部细节
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Server => "服务器内部错误".to_string(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建认证错误
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// 创建权限错误
    pub fn permission<T: Into<String>>(message: T) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation<T: Into<String>>(message: T, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict<R: Into<String>, I: Into<String>>(resource_type: R, identifier: I) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建账单错误
    pub fn billing<T: Into<String>>(message: T) -> Self {
        Self::Billing {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的账单错误
    pub fn billing_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Billing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的邮件错误
    pub fn email_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Email {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建邮件错误
    pub fn email<T: Into<String>>(message: T) -> Self {
        Self::Email {
            message: message.into(),
            source: None,
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
