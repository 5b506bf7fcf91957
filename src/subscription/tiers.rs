//! # 订阅等级表
//!
//! 进程级只读常量表：四个等级的价格、功能列表与数量限制。
//! 等级名输入大小写不敏感；无法识别的等级一律按 FREE（0 级）处理。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 数量限制中表示“无限”的取值
pub const UNLIMITED: i32 = -1;

/// 订阅等级，按权限从低到高排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Seeker,
    Initiate,
    Elder,
}

impl Tier {
    /// 所有等级，按序排列
    pub const ALL: [Self; 4] = [Self::Free, Self::Seeker, Self::Initiate, Self::Elder];

    /// 等级序号（0–3）
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Seeker => 1,
            Self::Initiate => 2,
            Self::Elder => 3,
        }
    }

    /// 规范化的小写名称，也是数据库中保存的值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Seeker => "seeker",
            Self::Initiate => "initiate",
            Self::Elder => "elder",
        }
    }

    /// 严格解析：大小写不敏感，未知名称返回 `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(name))
    }

    /// 宽松解析：未知名称降级为 `Free`
    #[must_use]
    pub fn from_name_lenient(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::Free)
    }

    /// 下一个更高的等级，`Elder` 没有
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Free => Some(Self::Seeker),
            Self::Seeker => Some(Self::Initiate),
            Self::Initiate => Some(Self::Elder),
            Self::Elder => None,
        }
    }

    /// 是否为付费等级
    #[must_use]
    pub const fn is_paid(self) -> bool {
        !matches!(self, Self::Free)
    }

    /// 等级配置
    #[must_use]
    pub fn config(self) -> &'static TierConfig {
        &TIER_TABLE[self.level() as usize]
    }

    /// `self` 是否不低于 `required`
    #[must_use]
    pub const fn at_least(self, required: Self) -> bool {
        self.level() >= required.level()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 各类内容的数量限制，`-1` 表示无限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierLimits {
    pub gates: i32,
    pub realms: i32,
    pub books: i32,
    pub ai_insights: i32,
}

/// 单个等级的静态配置
#[derive(Debug, Clone, Serialize)]
pub struct TierConfig {
    pub tier: Tier,
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// 月费（美分）
    pub monthly_price_cents: u32,
    /// Stripe 价格 ID，必须与 Stripe 后台的商品目录一致；免费等级为空
    pub stripe_price_id: Option<&'static str>,
    pub features: &'static [&'static str],
    pub limits: TierLimits,
}

/// 等级表，下标即等级序号
pub static TIER_TABLE: [TierConfig; 4] = [
    TierConfig {
        tier: Tier::Free,
        name: "free",
        display_name: "Free",
        description: "Begin the journey with the opening gates",
        monthly_price_cents: 0,
        stripe_price_id: None,
        features: &[
            "Access to the first 3 gates",
            "1 realm overview",
            "Sample chapter of 1 book",
        ],
        limits: TierLimits {
            gates: 3,
            realms: 1,
            books: 1,
            ai_insights: 0,
        },
    },
    TierConfig {
        tier: Tier::Seeker,
        name: "seeker",
        display_name: "Seeker",
        description: "Walk the first realms and join the inner circle",
        monthly_price_cents: 999,
        stripe_price_id: Some("price_1QSeekerMonthly33rdHouse"),
        features: &[
            "Access to 12 gates",
            "4 realms",
            "5 full books",
            "Inner circle community",
            "Chartography",
            "Audio meditations",
            "10 AI insights per month",
        ],
        limits: TierLimits {
            gates: 12,
            realms: 4,
            books: 5,
            ai_insights: 10,
        },
    },
    TierConfig {
        tier: Tier::Initiate,
        name: "initiate",
        display_name: "Initiate",
        description: "Full curriculum with the AI guide",
        monthly_price_cents: 1999,
        stripe_price_id: Some("price_1QInitiateMonthly33rdHouse"),
        features: &[
            "All gates and realms",
            "Complete library",
            "AI chatbot guide",
            "50 AI insights per month",
            "Everything in Seeker",
        ],
        limits: TierLimits {
            gates: UNLIMITED,
            realms: UNLIMITED,
            books: UNLIMITED,
            ai_insights: 50,
        },
    },
    TierConfig {
        tier: Tier::Elder,
        name: "elder",
        display_name: "Elder",
        description: "Unlimited access to every teaching",
        monthly_price_cents: 4999,
        stripe_price_id: Some("price_1QElderMonthly33rdHouse"),
        features: &[
            "Unlimited AI insights",
            "Early access to new teachings",
            "Everything in Initiate",
        ],
        limits: TierLimits {
            gates: UNLIMITED,
            realms: UNLIMITED,
            books: UNLIMITED,
            ai_insights: UNLIMITED,
        },
    },
];

/// 等级名 -> 序号，未知名称为 0
#[must_use]
pub fn tier_level(name: &str) -> u8 {
    Tier::from_name_lenient(name).level()
}

/// `level(user_tier) >= level(required_tier)`
#[must_use]
pub fn tier_at_least(user_tier: &str, required_tier: &str) -> bool {
    tier_level(user_tier) >= tier_level(required_tier)
}

/// 根据 Stripe 价格 ID 反查等级
#[must_use]
pub fn tier_for_price_id(price_id: &str) -> Option<Tier> {
    TIER_TABLE
        .iter()
        .find(|config| config.stripe_price_id == Some(price_id))
        .map(|config| config.tier)
}
