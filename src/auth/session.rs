//! # 会话台账
//!
//! 会话在登录时创建，有效期 30 天；每次鉴权请求读取并刷新 `last_activity`。
//! 过期会话不做后台清理，只是被所有活跃会话查询排除。

use chrono::{Duration, Utc};
use entity::user_sessions;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

use super::tokens::generate_token;
use crate::error::Result;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 请求方的设备信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    #[must_use]
    pub fn device_label(&self) -> &'static str {
        device_label(self.user_agent.as_deref())
    }
}

/// 按 User-Agent 粗略分类设备，按顺序首个命中为准
#[must_use]
pub fn device_label(user_agent: Option<&str>) -> &'static str {
    const RULES: [(&str, &str); 6] = [
        ("iPhone", "iPhone"),
        ("iPad", "iPad"),
        ("Android", "Android Device"),
        ("Windows", "Windows PC"),
        ("Mac", "Mac"),
        ("Linux", "Linux PC"),
    ];

    let Some(user_agent) = user_agent else {
        return "Unknown Device";
    };
    RULES
        .iter()
        .find(|(needle, _)| user_agent.contains(*needle))
        .map_or("Unknown Device", |(_, label)| *label)
}

/// 会话台账
pub struct SessionLedger {
    db: Arc<DatabaseConnection>,
    ttl: Duration,
}

impl SessionLedger {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, ttl_days: i64) -> Self {
        Self {
            db,
            ttl: Duration::days(ttl_days),
        }
    }

    /// 创建会话并返回令牌
    pub async fn create_session(&self, user_id: i32, client: &ClientInfo) -> Result<String> {
        let now = Utc::now().naive_utc();
        let token = generate_token();

        user_sessions::ActiveModel {
            user_id: Set(user_id),
            session_token: Set(token.clone()),
            ip_address: Set(client.ip_address.clone()),
            user_agent: Set(client.user_agent.clone()),
            device_info: Set(client.device_label().to_string()),
            expires_at: Set(now + self.ttl),
            last_activity: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::Session,
            "session_created",
            &format!("Created session for user {user_id}")
        );
        Ok(token)
    }

    /// 校验令牌：未过期则刷新活跃时间并返回会话；未知或过期返回 `None`
    pub async fn validate(&self, token: &str) -> Result<Option<user_sessions::Model>> {
        let now = Utc::now().naive_utc();
        let Some(session) = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionToken.eq(token))
            .filter(user_sessions::Column::ExpiresAt.gt(now))
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        user_sessions::Entity::update_many()
            .col_expr(user_sessions::Column::LastActivity, Expr::value(now))
            .filter(user_sessions::Column::Id.eq(session.id))
            .exec(self.db.as_ref())
            .await?;

        Ok(Some(user_sessions::Model {
            last_activity: now,
            ..session
        }))
    }

    /// 活跃会话，按最近活跃倒序
    pub async fn list_active_sessions(&self, user_id: i32) -> Result<Vec<user_sessions::Model>> {
        Ok(user_sessions::Entity::find()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::ExpiresAt.gt(Utc::now().naive_utc()))
            .order_by_desc(user_sessions::Column::LastActivity)
            .order_by_desc(user_sessions::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    /// 删除令牌对应的会话；不存在时什么也不做
    pub async fn revoke_session(&self, token: &str) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::SessionToken.eq(token))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// 按会话 id 删除，只作用于该用户自己的会话
    pub async fn revoke_user_session_by_id(&self, user_id: i32, session_id: i32) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::Id.eq(session_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// 删除该用户除 `keep_token` 外的所有会话
    pub async fn revoke_all_other_sessions(&self, user_id: i32, keep_token: &str) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::SessionToken.ne(keep_token))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// 删除该用户的全部会话
    pub async fn revoke_all_sessions(&self, user_id: i32) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_label_priority() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";
        let ipad = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)";

        assert_eq!(device_label(Some(iphone)), "iPhone");
        assert_eq!(device_label(Some(ipad)), "iPad");
        assert_eq!(device_label(Some(android)), "Android Device");
        assert_eq!(device_label(Some("Mozilla/5.0 (Windows NT 10.0; Win64)")), "Windows PC");
        assert_eq!(device_label(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X)")), "Mac");
        assert_eq!(device_label(Some("Mozilla/5.0 (X11; Linux x86_64)")), "Linux PC");
        assert_eq!(device_label(Some("curl/8.0")), "Unknown Device");
        assert_eq!(device_label(None), "Unknown Device");
    }
}
