//! # 错误处理测试

use crate::error::{AppError, AuthError, BillingError, Context, ErrorCategory};
use axum::http::StatusCode;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = AppError::config("测试配置错误");
    assert!(matches!(err, AppError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = AppError::config_with_source("配置文件加载失败", io_err);

    assert!(matches!(err, AppError::Config { .. }));
    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_context_wraps_and_keeps_status() {
    let result: Result<(), AppError> = Err(AppError::not_found("user", "42"));
    let err = result.context("加载用户失败").unwrap_err();

    assert!(matches!(err, AppError::Context { .. }));
    assert!(err.to_string().starts_with("加载用户失败"));
    assert_eq!(err.to_http_response_parts().0, StatusCode::NOT_FOUND);
}

#[test]
fn test_auth_error_mapping() {
    let err: AppError = AuthError::InvalidCredentials.into();
    assert_eq!(err.to_http_response_parts(), (StatusCode::UNAUTHORIZED, "AUTH_ERROR"));

    let err: AppError = AuthError::TokenNotFound.into();
    assert_eq!(err.to_http_response_parts().0, StatusCode::NOT_FOUND);

    let err: AppError = AuthError::EmailTaken.into();
    assert_eq!(err.to_http_response_parts().0, StatusCode::CONFLICT);

    let err: AppError = AuthError::AdminRequired.into();
    assert_eq!(err.to_http_response_parts().0, StatusCode::FORBIDDEN);
}

#[test]
fn test_billing_error_mapping() {
    let err: AppError = BillingError::TierNotPurchasable("free".to_string()).into();
    assert!(matches!(err, AppError::Validation { .. }));

    let err: AppError = BillingError::Api {
        status: 402,
        message: "card_declined".to_string(),
    }
    .into();
    assert_eq!(err.to_http_response_parts().0, StatusCode::BAD_GATEWAY);
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_verification_failures_are_classified() {
    assert!(BillingError::SignatureMismatch.is_verification_failure());
    assert!(BillingError::MissingWebhookSecret.is_verification_failure());
    assert!(!BillingError::MalformedEvent("x".into()).is_verification_failure());
}

#[test]
fn test_public_message_hides_server_details() {
    let err = AppError::database("connection refused at 10.0.0.3");
    assert!(!err.public_message().contains("10.0.0.3"));

    let err = AppError::validation("email is required", Some("email"));
    assert!(err.public_message().contains("email is required"));
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let app_err: AppError = io_err.into();

    assert!(matches!(app_err, AppError::Io { .. }));
}
