//! # HTTP API
//!
//! 路由、处理器、中间件与统一响应格式

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState, build_router};
