//! # 登录历史
//!
//! 只追加的审计记录。写入在后台任务中进行，失败只记日志，不影响登录流程。

use chrono::Utc;
use entity::login_history;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::session::ClientInfo;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// 登录方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Password,
    TwoFactor,
}

impl LoginMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::TwoFactor => "2fa",
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次登录尝试
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub user_id: i32,
    pub method: LoginMethod,
    pub success: bool,
    pub client: ClientInfo,
    pub failure_reason: Option<String>,
}

impl LoginAttempt {
    #[must_use]
    pub fn succeeded(user_id: i32, method: LoginMethod, client: &ClientInfo) -> Self {
        Self {
            user_id,
            method,
            success: true,
            client: client.clone(),
            failure_reason: None,
        }
    }

    #[must_use]
    pub fn failed(user_id: i32, method: LoginMethod, client: &ClientInfo, reason: &str) -> Self {
        Self {
            user_id,
            method,
            success: false,
            client: client.clone(),
            failure_reason: Some(reason.to_string()),
        }
    }
}

/// 登录历史记录器
#[derive(Clone)]
pub struct LoginHistory {
    db: Arc<DatabaseConnection>,
}

impl LoginHistory {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 后台写入，调用方无需等待；返回的句柄仅供测试等待
    pub fn log_attempt(&self, attempt: LoginAttempt) -> JoinHandle<()> {
        let history = self.clone();
        tokio::spawn(async move {
            let user_id = attempt.user_id;
            if let Err(e) = history.record(&attempt).await {
                lwarn!(
                    "system",
                    LogStage::BackgroundTask,
                    LogComponent::LoginHistory,
                    "record_failed",
                    &format!("Failed to record login attempt for user {user_id}: {e}")
                );
            }
        })
    }

    /// 同步写入一条记录
    pub async fn record(&self, attempt: &LoginAttempt) -> Result<()> {
        login_history::ActiveModel {
            user_id: Set(attempt.user_id),
            login_method: Set(attempt.method.as_str().to_string()),
            success: Set(attempt.success),
            ip_address: Set(attempt.client.ip_address.clone()),
            user_agent: Set(attempt.client.user_agent.clone()),
            device_info: Set(Some(attempt.client.device_label().to_string())),
            failure_reason: Set(attempt.failure_reason.clone()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// 最近的登录记录，新的在前
    pub async fn recent(&self, user_id: i32, limit: u64) -> Result<Vec<login_history::Model>> {
        Ok(login_history::Entity::find()
            .filter(login_history::Column::UserId.eq(user_id))
            .order_by_desc(login_history::Column::CreatedAt)
            .order_by_desc(login_history::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?)
    }
}
