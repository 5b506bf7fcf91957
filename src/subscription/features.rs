//! # 功能门控
//!
//! 功能名到最低等级的静态映射。未登记的功能不受限制。

use serde::Serialize;

use super::tiers::Tier;

/// 受等级限制的功能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    InnerCircle,
    AiChatbot,
    Chartography,
    FullBooks,
    AudioMeditations,
}

impl Feature {
    pub const ALL: [Self; 5] = [
        Self::InnerCircle,
        Self::AiChatbot,
        Self::Chartography,
        Self::FullBooks,
        Self::AudioMeditations,
    ];

    /// 前端使用的功能名
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InnerCircle => "innerCircle",
            Self::AiChatbot => "aiChatbot",
            Self::Chartography => "chartography",
            Self::FullBooks => "fullBooks",
            Self::AudioMeditations => "audioMeditations",
        }
    }

    /// 按名称查找，名称区分大小写
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == name)
    }

    /// 使用该功能所需的最低等级
    #[must_use]
    pub const fn min_tier(self) -> Tier {
        match self {
            Self::AiChatbot => Tier::Initiate,
            Self::InnerCircle | Self::Chartography | Self::FullBooks | Self::AudioMeditations => {
                Tier::Seeker
            }
        }
    }
}

/// 功能名对应的最低等级；未登记的功能返回 `None`
#[must_use]
pub fn required_tier(feature_name: &str) -> Option<Tier> {
    Feature::from_name(feature_name).map(Feature::min_tier)
}

/// 仅比较等级：未知功能放行，已知功能要求 `level(user_tier) >= level(required)`。
/// 未登录用户的拒绝由调用方负责。
#[must_use]
pub fn can_access(user_tier: &str, feature_name: &str) -> bool {
    required_tier(feature_name)
        .is_none_or(|required| Tier::from_name_lenient(user_tier).at_least(required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeker_scenario() {
        assert!(!can_access("seeker", "aiChatbot"));
        assert!(can_access("seeker", "fullBooks"));
    }

    #[test]
    fn test_unknown_feature_is_open() {
        for tier in Tier::ALL {
            assert!(can_access(tier.as_str(), "moonPhases"));
        }
        assert!(can_access("bogus", "moonPhases"));
    }

    #[test]
    fn test_unknown_tier_is_free() {
        assert!(!can_access("platinum", "innerCircle"));
        assert!(can_access("ELDER", "aiChatbot"));
    }

    #[test]
    fn test_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_name(feature.as_str()), Some(feature));
        }
        assert_eq!(required_tier("chartography"), Some(Tier::Seeker));
        assert_eq!(required_tier("Chartography"), None);
    }
}
