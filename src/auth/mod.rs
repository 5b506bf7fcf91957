//! # 认证模块
//!
//! 密码、会话台账、登录历史、双因素认证与认证服务

pub mod challenge;
pub mod login_history;
pub mod password;
pub mod service;
pub mod session;
pub mod tokens;
pub mod two_factor;

pub use login_history::{LoginAttempt, LoginHistory, LoginMethod};
pub use service::{AuthService, AuthenticatedSession, LoginOutcome, RegisterRequest, UserProfile};
pub use session::{ClientInfo, SessionLedger, device_label};
pub use two_factor::{TwoFactorGate, TwoFactorSetup};
