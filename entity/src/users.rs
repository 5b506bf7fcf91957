//! # 用户实体定义
//!
//! 用户身份、订阅状态与双因素认证字段的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    /// free / seeker / initiate / elder，读取时大小写不敏感
    pub subscription_tier: String,
    /// active / past_due / canceled 等，由账单 webhook 写入
    pub subscription_status: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_ends_at: Option<DateTime>,
    pub two_factor_enabled: bool,
    #[serde(skip_serializing)]
    pub two_factor_secret: Option<String>,
    /// 重置令牌的 SHA-256 摘要，新令牌直接覆盖旧令牌
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime>,
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_sessions::Entity")]
    UserSessions,
    #[sea_orm(has_many = "super::login_history::Entity")]
    LoginHistory,
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSessions.def()
    }
}

impl Related<super::login_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoginHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
