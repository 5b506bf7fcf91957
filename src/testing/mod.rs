//! # 测试框架模块
//!
//! 提供内存数据库、测试配置与用户 fixtures，供单元测试和 `tests/` 集成测试共用

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
