//! # 等级与功能门控测试
//!
//! 等级序、功能最低等级以及访问视图的性质测试

use house_membership::subscription::{
    Feature, LimitKind, SubscriptionAccess, TIER_TABLE, Tier, can_access, required_tier,
    tier_at_least, tier_level,
};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("free", 0)]
#[case("seeker", 1)]
#[case("initiate", 2)]
#[case("elder", 3)]
#[case("ELDER", 3)]
#[case(" Seeker ", 1)]
#[case("bogus", 0)]
#[case("", 0)]
fn tier_levels(#[case] name: &str, #[case] expected: u8) {
    assert_eq!(tier_level(name), expected);
}

#[test]
fn tier_levels_strictly_increase() {
    let levels: Vec<u8> = Tier::ALL.iter().map(|tier| tier_level(tier.as_str())).collect();
    assert!(levels.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(tier_level("bogus"), tier_level("free"));
}

#[test]
fn tier_table_is_ordered_by_level() {
    for (index, config) in TIER_TABLE.iter().enumerate() {
        assert_eq!(usize::from(config.tier.level()), index);
        assert_eq!(config.tier.is_paid(), config.stripe_price_id.is_some());
    }
}

#[rstest]
#[case("seeker", "aiChatbot", false)]
#[case("seeker", "fullBooks", true)]
#[case("free", "innerCircle", false)]
#[case("initiate", "aiChatbot", true)]
#[case("elder", "audioMeditations", true)]
#[case("free", "notGatedAnywhere", true)]
fn feature_scenarios(#[case] tier: &str, #[case] feature: &str, #[case] allowed: bool) {
    assert_eq!(can_access(tier, feature), allowed);
}

#[test]
fn unauthenticated_access_denies_every_feature() {
    let access = SubscriptionAccess::unauthenticated();
    for feature in Feature::ALL {
        assert!(!access.can_access(feature.as_str()));
    }
    assert!(!access.can_access("notGatedAnywhere"));
}

#[test]
fn elder_limits_are_unlimited() {
    let access = SubscriptionAccess::from_parts("elder", Some("active"), None);
    assert!(SubscriptionAccess::is_unlimited(access.limit(LimitKind::Books)));
    assert!(access.within_limit(LimitKind::AiInsights, u32::MAX));
    assert_eq!(access.upgrade_target(), None);
}

fn tier_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("free".to_string()),
        Just("seeker".to_string()),
        Just("initiate".to_string()),
        Just("elder".to_string()),
        "[a-zA-Z]{0,12}",
    ]
}

proptest! {
    #[test]
    fn gated_features_follow_tier_order(tier in tier_name(), index in 0usize..Feature::ALL.len()) {
        let feature = Feature::ALL[index];
        let required = feature.min_tier();
        prop_assert_eq!(
            can_access(&tier, feature.as_str()),
            tier_level(&tier) >= required.level()
        );
        prop_assert_eq!(required_tier(feature.as_str()), Some(required));
    }

    #[test]
    fn ungated_features_are_open(tier in tier_name(), feature in "zz[a-z]{1,10}") {
        prop_assert!(can_access(&tier, &feature));
    }

    #[test]
    fn tier_at_least_matches_levels(a in tier_name(), b in tier_name()) {
        prop_assert_eq!(tier_at_least(&a, &b), tier_level(&a) >= tier_level(&b));
    }
}
