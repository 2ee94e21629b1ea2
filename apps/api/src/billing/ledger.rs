//! Credit ledger — pure accounting rules for the credit/tier gate.
//!
//! Nothing in here touches the database. `store` loads an `Account` under a row
//! lock, runs these rules, and writes the result back.
//!
//! Invariants:
//! - `0 <= credits <= max_credits`
//! - a refused charge leaves credits and counters untouched
//! - usage counters only move back to 0, and only when the month key changes

use axum::http::StatusCode;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::billing::tier::{Feature, Tier, UsageCounter};

/// `YYYY-MM` key of the UTC calendar month containing `at`.
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

pub fn current_month_key() -> String {
    month_key(Utc::now())
}

/// The billing-relevant slice of a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub tier: Tier,
    pub credits: i32,
    pub max_credits: i32,
    pub alumni_searches_used: i32,
    pub coffee_chat_preps_used: i32,
    pub interview_preps_used: i32,
    pub usage_month_key: String,
}

/// An authorized, not yet applied, deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Charge {
    pub feature: Feature,
    pub cost: i32,
    pub balance_after: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRefusal {
    #[error("{}", insufficient_message(*.required, *.available, *.tier))]
    InsufficientCredits {
        required: i32,
        available: i32,
        tier: Tier,
    },

    #[error(
        "{} requires the {} plan. You are on the {} plan.",
        .feature.display_name(),
        .required_tier.display_name(),
        .tier.display_name()
    )]
    FeatureNotInTier {
        feature: Feature,
        tier: Tier,
        required_tier: Tier,
    },

    #[error("{}", limit_message(*.feature, *.used, *.limit, *.tier))]
    UsageLimitReached {
        feature: Feature,
        used: i32,
        limit: i32,
        tier: Tier,
    },
}

fn insufficient_message(required: i32, available: i32, tier: Tier) -> String {
    match tier.next_upgrade() {
        Some(next) => format!(
            "You need {required} credits but have {available}. Upgrade to {} for {} credits per month.",
            next.display_name(),
            next.max_credits()
        ),
        None => format!(
            "You need {required} credits but have {available}. Credits refill at the start of next month."
        ),
    }
}

fn limit_message(feature: Feature, used: i32, limit: i32, tier: Tier) -> String {
    let base = format!(
        "You've used {used} of {limit} {} this month on the {} plan.",
        feature.display_name().to_lowercase(),
        tier.display_name()
    );
    match tier.next_upgrade() {
        Some(next) => format!("{base} Upgrade to {} for more.", next.display_name()),
        None => base,
    }
}

impl GateRefusal {
    pub fn status(&self) -> StatusCode {
        match self {
            GateRefusal::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            GateRefusal::FeatureNotInTier { .. } | GateRefusal::UsageLimitReached { .. } => {
                StatusCode::FORBIDDEN
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GateRefusal::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            GateRefusal::FeatureNotInTier { .. } => "FEATURE_NOT_IN_TIER",
            GateRefusal::UsageLimitReached { .. } => "USAGE_LIMIT_REACHED",
        }
    }

    pub fn details(&self) -> Value {
        match self {
            GateRefusal::InsufficientCredits {
                required,
                available,
                tier,
            } => json!({
                "required": required,
                "available": available,
                "tier": tier,
                "upgrade_tier": tier.next_upgrade(),
            }),
            GateRefusal::FeatureNotInTier {
                feature,
                tier,
                required_tier,
            } => json!({
                "feature": feature,
                "tier": tier,
                "required_tier": required_tier,
            }),
            GateRefusal::UsageLimitReached {
                feature,
                used,
                limit,
                tier,
            } => json!({
                "feature": feature,
                "used": used,
                "limit": limit,
                "tier": tier,
                "upgrade_tier": tier.next_upgrade(),
            }),
        }
    }
}

impl Account {
    /// A freshly created account: full allotment for the tier, zeroed counters.
    pub fn new(tier: Tier, month_key: &str) -> Self {
        Self {
            tier,
            credits: tier.max_credits(),
            max_credits: tier.max_credits(),
            alumni_searches_used: 0,
            coffee_chat_preps_used: 0,
            interview_preps_used: 0,
            usage_month_key: month_key.to_string(),
        }
    }

    pub fn usage(&self, counter: UsageCounter) -> i32 {
        match counter {
            UsageCounter::AlumniSearches => self.alumni_searches_used,
            UsageCounter::CoffeeChatPreps => self.coffee_chat_preps_used,
            UsageCounter::InterviewPreps => self.interview_preps_used,
        }
    }

    fn usage_mut(&mut self, counter: UsageCounter) -> &mut i32 {
        match counter {
            UsageCounter::AlumniSearches => &mut self.alumni_searches_used,
            UsageCounter::CoffeeChatPreps => &mut self.coffee_chat_preps_used,
            UsageCounter::InterviewPreps => &mut self.interview_preps_used,
        }
    }

    /// Starts a new usage period when `month_key` differs from the stored one:
    /// counters go to 0 and credits refill to the ceiling.
    /// Returns whether a roll happened.
    pub fn roll_month(&mut self, month_key: &str) -> bool {
        if self.usage_month_key == month_key {
            return false;
        }
        self.alumni_searches_used = 0;
        self.coffee_chat_preps_used = 0;
        self.interview_preps_used = 0;
        self.credits = self.max_credits;
        self.usage_month_key = month_key.to_string();
        true
    }

    /// Checks tier access, monthly limit and balance, in that order.
    pub fn authorize(&self, feature: Feature, cost: u32) -> Result<Charge, GateRefusal> {
        if self.tier < feature.min_tier() {
            return Err(GateRefusal::FeatureNotInTier {
                feature,
                tier: self.tier,
                required_tier: feature.min_tier(),
            });
        }

        if let (Some(counter), Some(limit)) = (feature.counter(), feature.monthly_limit(self.tier))
        {
            let used = self.usage(counter);
            if used >= limit {
                return Err(GateRefusal::UsageLimitReached {
                    feature,
                    used,
                    limit,
                    tier: self.tier,
                });
            }
        }

        let cost = match i32::try_from(cost) {
            Ok(cost) if cost <= self.credits => cost,
            _ => {
                return Err(GateRefusal::InsufficientCredits {
                    required: i32::try_from(cost).unwrap_or(i32::MAX),
                    available: self.credits,
                    tier: self.tier,
                })
            }
        };

        Ok(Charge {
            feature,
            cost,
            balance_after: self.credits - cost,
        })
    }

    pub fn apply_charge(&mut self, charge: &Charge) {
        self.credits = charge.balance_after;
        if let Some(counter) = charge.feature.counter() {
            *self.usage_mut(counter) += 1;
        }
    }

    /// Returns credits to the balance, never above the ceiling.
    /// Returns the amount actually credited. Usage counters are not rolled back.
    pub fn apply_refund(&mut self, amount: u32) -> i32 {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let headroom = self.max_credits - self.credits;
        let credited = amount.min(headroom).max(0);
        self.credits += credited;
        credited
    }

    /// Moves the account to a new tier. Upgrades grant the full new allotment,
    /// downgrades clamp the balance to the new ceiling.
    pub fn change_tier(&mut self, tier: Tier) {
        let upgrade = tier > self.tier;
        self.tier = tier;
        self.max_credits = tier.max_credits();
        self.credits = if upgrade {
            self.max_credits
        } else {
            self.credits.min(self.max_credits)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn account(tier: Tier, credits: i32) -> Account {
        Account {
            credits,
            ..Account::new(tier, "2026-10")
        }
    }

    #[test]
    fn test_month_key_is_zero_padded_utc() {
        let at = Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap();
        assert_eq!(month_key(at), "2026-03");
    }

    #[rstest]
    #[case(Tier::Free, 300)]
    #[case(Tier::Pro, 1500)]
    #[case(Tier::Elite, 3000)]
    fn test_new_account_gets_full_allotment(#[case] tier: Tier, #[case] expected: i32) {
        let acct = Account::new(tier, "2026-10");
        assert_eq!(acct.credits, expected);
        assert_eq!(acct.max_credits, expected);
    }

    #[test]
    fn test_charge_accepted_decrements_exactly() {
        let mut acct = account(Tier::Free, 300);
        let charge = acct.authorize(Feature::ContactSearch, 5).unwrap();
        assert_eq!(charge.balance_after, 295);
        acct.apply_charge(&charge);
        assert_eq!(acct.credits, 295);
    }

    #[test]
    fn test_charge_rejected_when_balance_short() {
        let acct = account(Tier::Free, 4);
        let before = acct.clone();
        let err = acct.authorize(Feature::ContactSearch, 5).unwrap_err();
        assert_eq!(
            err,
            GateRefusal::InsufficientCredits {
                required: 5,
                available: 4,
                tier: Tier::Free
            }
        );
        assert_eq!(acct, before);
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let acct = account(Tier::Pro, 25);
        let charge = acct.authorize(Feature::InterviewPrep, 25).unwrap();
        assert_eq!(charge.balance_after, 0);
    }

    #[test]
    fn test_huge_cost_is_insufficient_not_overflow() {
        let acct = account(Tier::Elite, 3000);
        let err = acct.authorize(Feature::ContactSearch, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            GateRefusal::InsufficientCredits {
                required: i32::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_feature_outside_tier_is_refused_before_balance() {
        let acct = account(Tier::Free, 0);
        let err = acct.authorize(Feature::ApplicationLab, 10).unwrap_err();
        assert_eq!(
            err,
            GateRefusal::FeatureNotInTier {
                feature: Feature::ApplicationLab,
                tier: Tier::Free,
                required_tier: Tier::Pro
            }
        );
        assert!(err.to_string().contains("Application Lab requires the Pro plan"));
    }

    #[test]
    fn test_monthly_limit_refuses_and_names_upgrade() {
        let mut acct = account(Tier::Free, 300);
        acct.coffee_chat_preps_used = 3;
        let err = acct.authorize(Feature::CoffeeChatPrep, 15).unwrap_err();
        assert!(matches!(
            err,
            GateRefusal::UsageLimitReached { used: 3, limit: 3, .. }
        ));
        assert!(err.to_string().contains("Upgrade to Pro"));
    }

    #[test]
    fn test_charge_advances_only_its_counter() {
        let mut acct = account(Tier::Pro, 1500);
        let charge = acct.authorize(Feature::InterviewPrep, 25).unwrap();
        acct.apply_charge(&charge);
        assert_eq!(acct.interview_preps_used, 1);
        assert_eq!(acct.coffee_chat_preps_used, 0);
        assert_eq!(acct.alumni_searches_used, 0);

        let charge = acct.authorize(Feature::ContactSearch, 15).unwrap();
        acct.apply_charge(&charge);
        assert_eq!(acct.interview_preps_used, 1);
    }

    #[test]
    fn test_roll_month_resets_once() {
        let mut acct = account(Tier::Free, 12);
        acct.alumni_searches_used = 7;
        acct.coffee_chat_preps_used = 2;

        assert!(acct.roll_month("2026-11"));
        assert_eq!(acct.alumni_searches_used, 0);
        assert_eq!(acct.coffee_chat_preps_used, 0);
        assert_eq!(acct.credits, 300);
        assert_eq!(acct.usage_month_key, "2026-11");

        let charge = acct.authorize(Feature::AlumniSearch, 15).unwrap();
        acct.apply_charge(&charge);
        assert!(!acct.roll_month("2026-11"));
        assert_eq!(acct.alumni_searches_used, 1);
    }

    #[test]
    fn test_same_month_never_decreases_counters() {
        let mut acct = account(Tier::Free, 300);
        acct.interview_preps_used = 1;
        acct.roll_month("2026-10");
        assert_eq!(acct.interview_preps_used, 1);
    }

    #[test]
    fn test_refund_is_clamped_to_ceiling() {
        let mut acct = account(Tier::Free, 290);
        assert_eq!(acct.apply_refund(45), 10);
        assert_eq!(acct.credits, 300);
    }

    #[test]
    fn test_refund_keeps_usage_counter() {
        let mut acct = account(Tier::Free, 300);
        let charge = acct.authorize(Feature::CoffeeChatPrep, 15).unwrap();
        acct.apply_charge(&charge);
        acct.apply_refund(15);
        assert_eq!(acct.credits, 300);
        assert_eq!(acct.coffee_chat_preps_used, 1);
    }

    #[test]
    fn test_upgrade_grants_new_allotment() {
        let mut acct = account(Tier::Free, 20);
        acct.change_tier(Tier::Pro);
        assert_eq!(acct.max_credits, 1500);
        assert_eq!(acct.credits, 1500);
    }

    #[test]
    fn test_downgrade_clamps_balance() {
        let mut acct = account(Tier::Elite, 2200);
        acct.change_tier(Tier::Free);
        assert_eq!(acct.max_credits, 300);
        assert_eq!(acct.credits, 300);

        let mut acct = account(Tier::Pro, 120);
        acct.change_tier(Tier::Free);
        assert_eq!(acct.credits, 120);
    }

    #[rstest]
    #[case(Tier::Free, 0, 5)]
    #[case(Tier::Free, 299, 300)]
    #[case(Tier::Pro, 1499, 1500)]
    #[case(Tier::Elite, 0, 1)]
    fn test_balance_never_goes_negative(#[case] tier: Tier, #[case] credits: i32, #[case] cost: u32) {
        let acct = account(tier, credits);
        assert!(acct.authorize(Feature::ContactSearch, cost).is_err());
    }

    #[test]
    fn test_elite_insufficient_message_mentions_refill() {
        let refusal = GateRefusal::InsufficientCredits {
            required: 25,
            available: 3,
            tier: Tier::Elite,
        };
        assert!(refusal.to_string().contains("refill"));
        assert_eq!(refusal.details()["upgrade_tier"], Value::Null);
    }
}
