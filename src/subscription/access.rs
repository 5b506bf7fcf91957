//! # 订阅访问视图
//!
//! 汇总某个用户的等级、状态、数量限制与各功能的放行结果，供 API 一次性返回给前端。

use chrono::NaiveDateTime;
use entity::users;
use serde::Serialize;
use std::collections::BTreeMap;

use super::features::{self, Feature};
use super::tiers::{Tier, TierLimits};

/// 受数量限制的内容类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Gates,
    Realms,
    Books,
    AiInsights,
}

/// 用户的订阅访问状态
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionAccess {
    pub authenticated: bool,
    pub tier: Tier,
    pub level: u8,
    pub status: Option<String>,
    pub ends_at: Option<NaiveDateTime>,
    pub limits: TierLimits,
    pub features: BTreeMap<&'static str, bool>,
    pub is_active_subscriber: bool,
    pub upgrade_target: Option<Tier>,
}

impl SubscriptionAccess {
    /// 根据用户记录构造
    #[must_use]
    pub fn for_user(user: &users::Model) -> Self {
        Self::from_parts(
            &user.subscription_tier,
            user.subscription_status.as_deref(),
            user.subscription_ends_at,
        )
    }

    /// 根据原始字段构造，未知等级按 `Free` 处理
    #[must_use]
    pub fn from_parts(tier: &str, status: Option<&str>, ends_at: Option<NaiveDateTime>) -> Self {
        let tier = Tier::from_name_lenient(tier);
        let features = Feature::ALL
            .into_iter()
            .map(|feature| (feature.as_str(), tier.at_least(feature.min_tier())))
            .collect();

        Self {
            authenticated: true,
            tier,
            level: tier.level(),
            status: status.map(str::to_string),
            ends_at,
            limits: tier.config().limits,
            features,
            is_active_subscriber: tier.is_paid()
                && matches!(status, None | Some("active" | "trialing")),
            upgrade_target: tier.next(),
        }
    }

    /// 未登录访问者：所有受控功能一律拒绝
    #[must_use]
    pub fn unauthenticated() -> Self {
        let mut access = Self::from_parts(Tier::Free.as_str(), None, None);
        access.authenticated = false;
        for allowed in access.features.values_mut() {
            *allowed = false;
        }
        access
    }

    /// 功能判定；未登录一律拒绝，未登记的功能对已登录用户放行
    #[must_use]
    pub fn can_access(&self, feature_name: &str) -> bool {
        self.authenticated && features::can_access(self.tier.as_str(), feature_name)
    }

    #[must_use]
    pub const fn is_unlimited(limit: i32) -> bool {
        limit < 0
    }

    /// 指定类别的数量限制
    #[must_use]
    pub const fn limit(&self, kind: LimitKind) -> i32 {
        match kind {
            LimitKind::Gates => self.limits.gates,
            LimitKind::Realms => self.limits.realms,
            LimitKind::Books => self.limits.books,
            LimitKind::AiInsights => self.limits.ai_insights,
        }
    }

    /// `count` 个该类内容是否都在限制之内（例如第 `count` 道门是否可以打开）
    #[must_use]
    pub fn within_limit(&self, kind: LimitKind, count: u32) -> bool {
        let limit = self.limit(kind);
        Self::is_unlimited(limit) || i64::from(count) <= i64::from(limit)
    }

    /// 建议的升级目标
    #[must_use]
    pub const fn upgrade_target(&self) -> Option<Tier> {
        self.upgrade_target
    }
}
