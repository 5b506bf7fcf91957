//! # Entity 模块
//!
//! 包含会员系统的 Sea-ORM 实体定义：用户、会话、登录历史

pub mod login_history;
pub mod user_sessions;
pub mod users;

pub use login_history::Entity as LoginHistory;
pub use user_sessions::Entity as UserSessions;
pub use users::Entity as Users;

#[cfg(test)]
mod tests;
