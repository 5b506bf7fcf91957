//! Errors related to Stripe webhooks and the Stripe REST API.

use thiserror::Error;

use super::AppError;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Webhook signing secret is not configured")]
    MissingWebhookSecret,

    #[error("Stripe secret key is not configured")]
    MissingSecretKey,

    #[error("Stripe-Signature header is missing")]
    MissingSignature,

    #[error("Stripe-Signature header is malformed: {0}")]
    MalformedSignature(String),

    #[error("No v1 signature matched the payload")]
    SignatureMismatch,

    #[error("Signature timestamp is outside the tolerance window ({age_secs}s old)")]
    TimestampOutsideTolerance { age_secs: i64 },

    #[error("Webhook payload is not a valid event: {0}")]
    MalformedEvent(String),

    #[error("Tier '{0}' cannot be purchased")]
    TierNotPurchasable(String),

    #[error("Stripe API returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl BillingError {
    /// Verification failures are acknowledged to Stripe rather than rejected.
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingWebhookSecret
                | Self::MissingSignature
                | Self::MalformedSignature(_)
                | Self::SignatureMismatch
                | Self::TimestampOutsideTolerance { .. }
        )
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::TierNotPurchasable(_) => Self::validation(err.to_string(), Some("tier")),
            BillingError::MissingSecretKey | BillingError::MissingWebhookSecret => {
                Self::config(err.to_string())
            }
            other => Self::billing_with_source(other.to_string(), other),
        }
    }
}
