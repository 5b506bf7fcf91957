//! # HTTP 服务器
//!
//! Axum HTTP服务器，提供认证、账户、订阅与 Stripe webhook API

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::system;
use super::middleware::request_id_middleware;
use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    #[must_use]
    pub const fn context_arc(&self) -> &Arc<AppContext> {
        &self.context
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// HTTP 服务器
pub struct ApiServer {
    config: ServerConfig,
    router: Router,
}

impl ApiServer {
    /// 创建新的服务器
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        let config = context.config.server.clone();
        let router = build_router(context);
        Self { config, router }
    }

    /// 启动服务器，收到 Ctrl-C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let bind_address = self.config.bind_address.clone();
        let ip = bind_address.parse::<std::net::IpAddr>().map_err(|e| {
            AppError::config_with_source(format!("Invalid bind address '{bind_address}'"), e)
        })?;
        let addr = SocketAddr::new(ip, self.config.port);

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting HTTP server on {addr}")
        );

        let listener = TcpListener::bind(&addr).await?;

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal_with_source("HTTP server error", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "HTTP server stopped"
        );
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_fail",
            &format!("Failed to listen for shutdown signal: {e}")
        );
    }
}

/// 组装完整路由（API 前缀、/ping、中间件）
pub fn build_router(context: Arc<AppContext>) -> Router {
    let config = context.config.server.clone();
    let state = AppState::new(context);
    let api_routes = super::routes::create_routes(state);

    let prefix = config.api_prefix.trim_end_matches('/');
    let mut app = if prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(prefix, api_routes)
    };
    app = app.route("/ping", get(system::ping_handler));

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));
    app = app.layer(service_builder);

    // 最外层，保证后续中间件都能拿到 request_id
    app.layer(axum::middleware::from_fn(request_id_middleware))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            cors_layer.allow_origin(Any)
        }
    }
}
