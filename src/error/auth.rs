//! Errors raised by the login, session and two-factor flows.

use thiserror::Error;

use super::AppError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("The user is not authenticated")]
    NotAuthenticated,

    #[error("Invalid two-factor code")]
    InvalidTwoFactorCode,

    #[error("Two-factor authentication is not configured for this account")]
    TwoFactorNotConfigured,

    #[error("Two-factor challenge is invalid or has expired")]
    ChallengeInvalid,

    /// Unknown and expired tokens are deliberately indistinguishable.
    #[error("Token not found")]
    TokenNotFound,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Administrator privileges required")]
    AdminRequired,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::NotAuthenticated
            | AuthError::InvalidTwoFactorCode
            | AuthError::ChallengeInvalid => Self::auth(err.to_string()),
            AuthError::TwoFactorNotConfigured | AuthError::WeakPassword { .. } => {
                Self::validation(err.to_string(), None)
            }
            AuthError::TokenNotFound => Self::not_found("token", "provided"),
            AuthError::EmailTaken => Self::conflict("user", "email"),
            AuthError::AdminRequired => Self::permission(err.to_string()),
        }
    }
}
