//! Subscription tiers and the billable features they unlock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Pro,
    Elite,
}

impl Tier {
    /// Credit ceiling granted at account creation and on each monthly refill.
    pub fn max_credits(self) -> i32 {
        match self {
            Tier::Free => 300,
            Tier::Pro => 1500,
            Tier::Elite => 3000,
        }
    }

    pub fn next_upgrade(self) -> Option<Tier> {
        match self {
            Tier::Free => Some(Tier::Pro),
            Tier::Pro => Some(Tier::Elite),
            Tier::Elite => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Elite => "elite",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Pro => "Pro",
            Tier::Elite => "Elite",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "elite" => Ok(Tier::Elite),
            other => Err(format!("unknown tier '{other}'")),
        }
    }
}

/// A billable action guarded by the credit gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ContactSearch,
    AlumniSearch,
    CoffeeChatPrep,
    InterviewPrep,
    ApplicationLab,
    JobBoard,
}

/// Which monthly usage counter a feature advances, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCounter {
    AlumniSearches,
    CoffeeChatPreps,
    InterviewPreps,
}

impl Feature {
    /// Credits charged per unit (per contact for searches, per document otherwise).
    pub fn unit_cost(self) -> i32 {
        match self {
            Feature::ContactSearch | Feature::AlumniSearch => 15,
            Feature::CoffeeChatPrep => 15,
            Feature::InterviewPrep => 25,
            Feature::ApplicationLab => 10,
            Feature::JobBoard => 0,
        }
    }

    pub fn min_tier(self) -> Tier {
        match self {
            Feature::ApplicationLab => Tier::Pro,
            _ => Tier::Free,
        }
    }

    pub fn counter(self) -> Option<UsageCounter> {
        match self {
            Feature::AlumniSearch => Some(UsageCounter::AlumniSearches),
            Feature::CoffeeChatPrep => Some(UsageCounter::CoffeeChatPreps),
            Feature::InterviewPrep => Some(UsageCounter::InterviewPreps),
            _ => None,
        }
    }

    /// Monthly usage cap for a tier. `None` means unlimited.
    pub fn monthly_limit(self, tier: Tier) -> Option<i32> {
        match (self, tier) {
            (Feature::AlumniSearch, Tier::Free) => Some(10),
            (Feature::AlumniSearch, Tier::Pro) => Some(50),
            (Feature::CoffeeChatPrep, Tier::Free) => Some(3),
            (Feature::CoffeeChatPrep, Tier::Pro) => Some(10),
            (Feature::InterviewPrep, Tier::Free) => Some(2),
            (Feature::InterviewPrep, Tier::Pro) => Some(5),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::ContactSearch => "contact_search",
            Feature::AlumniSearch => "alumni_search",
            Feature::CoffeeChatPrep => "coffee_chat_prep",
            Feature::InterviewPrep => "interview_prep",
            Feature::ApplicationLab => "application_lab",
            Feature::JobBoard => "job_board",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Feature::ContactSearch => "Contact search",
            Feature::AlumniSearch => "Alumni search",
            Feature::CoffeeChatPrep => "Coffee chat prep",
            Feature::InterviewPrep => "Interview prep",
            Feature::ApplicationLab => "Application Lab",
            Feature::JobBoard => "Job board",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Tier::Free, 300)]
    #[case(Tier::Pro, 1500)]
    #[case(Tier::Elite, 3000)]
    fn test_max_credits_per_tier(#[case] tier: Tier, #[case] expected: i32) {
        assert_eq!(tier.max_credits(), expected);
    }

    #[test]
    fn test_tier_round_trips_through_str() {
        for tier in [Tier::Free, Tier::Pro, Tier::Elite] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!(" PRO ".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(Tier::Free < Tier::Pro);
        assert!(Tier::Pro < Tier::Elite);
        assert_eq!(Tier::Elite.next_upgrade(), None);
    }

    #[test]
    fn test_elite_has_no_monthly_limits() {
        for feature in [
            Feature::AlumniSearch,
            Feature::CoffeeChatPrep,
            Feature::InterviewPrep,
        ] {
            assert_eq!(feature.monthly_limit(Tier::Elite), None);
        }
    }

    #[test]
    fn test_only_counted_features_have_limits() {
        for tier in [Tier::Free, Tier::Pro, Tier::Elite] {
            assert_eq!(Feature::ContactSearch.monthly_limit(tier), None);
            assert_eq!(Feature::JobBoard.monthly_limit(tier), None);
        }
        assert!(Feature::ContactSearch.counter().is_none());
    }

    #[test]
    fn test_feature_serializes_snake_case() {
        let json = serde_json::to_string(&Feature::CoffeeChatPrep).unwrap();
        assert_eq!(json, r#""coffee_chat_prep""#);
    }
}
