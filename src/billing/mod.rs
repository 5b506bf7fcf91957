//! # 账单模块
//!
//! Stripe REST API 客户端

pub mod stripe;

pub use stripe::{CheckoutSession, SeededProduct, StripeClient};
