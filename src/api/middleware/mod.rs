//! # HTTP 中间件

pub mod auth;
pub mod request_id;

pub use auth::{AuthContext, SESSION_COOKIE, extract_session_token, require_session, resolve_auth};
pub use request_id::{RequestId, request_id_middleware};
