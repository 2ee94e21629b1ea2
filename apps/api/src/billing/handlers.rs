//! Axum route handlers for the Billing API.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::billing::ledger::Account;
use crate::billing::store;
use crate::billing::tier::{Feature, Tier, UsageCounter};
use crate::errors::AppError;
use crate::integrations::stripe::{CheckoutParams, StripeEvent};
use crate::models::user::ActivityRow;
use crate::state::AppState;

const ACTIVITY_PAGE_SIZE: i64 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UsageLine {
    pub feature: Feature,
    pub used: i32,
    /// `None` means unlimited on the current tier.
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CreditSummary {
    pub tier: Tier,
    pub credits: i32,
    pub max_credits: i32,
    pub usage_month_key: String,
    pub usage: Vec<UsageLine>,
}

impl From<&Account> for CreditSummary {
    fn from(account: &Account) -> Self {
        let usage = [
            (Feature::AlumniSearch, UsageCounter::AlumniSearches),
            (Feature::CoffeeChatPrep, UsageCounter::CoffeeChatPreps),
            (Feature::InterviewPrep, UsageCounter::InterviewPreps),
        ]
        .into_iter()
        .map(|(feature, counter)| UsageLine {
            feature,
            used: account.usage(counter),
            limit: feature.monthly_limit(account.tier),
        })
        .collect();

        CreditSummary {
            tier: account.tier,
            credits: account.credits,
            max_credits: account.max_credits,
            usage_month_key: account.usage_month_key.clone(),
            usage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tier: Tier,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/billing/credits
pub async fn handle_get_credits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CreditSummary>, AppError> {
    let account = store::load_account(&state.db, &auth.uid).await?;
    Ok(Json(CreditSummary::from(&account)))
}

/// GET /api/v1/billing/activity
pub async fn handle_get_activity(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ActivityRow>>, AppError> {
    let rows = store::recent_activity(&state.db, &auth.uid, ACTIVITY_PAGE_SIZE).await?;
    Ok(Json(rows))
}

/// POST /api/v1/billing/checkout
///
/// Starts a Stripe Checkout subscription for a paid tier.
pub async fn handle_checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let price_id = match request.tier {
        Tier::Free => {
            return Err(AppError::Validation(
                "Checkout is only available for paid tiers".to_string(),
            ))
        }
        Tier::Pro => state.config.stripe_price_pro.as_str(),
        Tier::Elite => state.config.stripe_price_elite.as_str(),
    };

    let current = auth.user.tier()?;
    if current >= request.tier {
        return Err(AppError::Validation(format!(
            "You are already on the {} plan",
            current.display_name()
        )));
    }

    let success_url = format!("{}/billing?checkout=success", state.config.frontend_url);
    let cancel_url = format!("{}/billing?checkout=cancelled", state.config.frontend_url);

    let session = state
        .stripe
        .create_checkout_session(CheckoutParams {
            price_id,
            uid: &auth.uid,
            email: &auth.email,
            tier: request.tier.as_str(),
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    let url = session
        .url
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Stripe session has no URL")))?;

    info!("Created checkout session {} for user {}", session.id, auth.uid);
    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url,
    }))
}

/// POST /api/v1/billing/webhook
///
/// Unauthenticated. Only the event id is taken from the body; the event itself
/// is re-fetched from Stripe before anything is applied.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<WebhookEnvelope>,
) -> Result<StatusCode, AppError> {
    if !is_event_id(&envelope.id) {
        return Err(AppError::Validation("Not a Stripe event id".to_string()));
    }

    let event = state.stripe.retrieve_event(&envelope.id).await?;
    match interpret_event(&event) {
        Some(WebhookAction::Activate {
            uid,
            tier,
            customer_id,
        }) => {
            store::set_tier(&state.db, &uid, tier).await?;
            if let Some(customer_id) = customer_id {
                store::set_stripe_customer(&state.db, &uid, &customer_id).await?;
            }
        }
        Some(WebhookAction::Cancel { customer_id }) => {
            store::set_tier_by_customer(&state.db, &customer_id, Tier::Free).await?;
        }
        None => info!("Ignoring Stripe event {} ({})", event.id, event.event_type),
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `evt_` followed by alphanumerics or underscores. The id ends up in a Stripe URL path.
fn is_event_id(id: &str) -> bool {
    id.len() <= 255
        && id
            .strip_prefix("evt_")
            .is_some_and(|rest| {
                !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
            })
}

#[derive(Debug, PartialEq, Eq)]
enum WebhookAction {
    Activate {
        uid: String,
        tier: Tier,
        customer_id: Option<String>,
    },
    Cancel {
        customer_id: String,
    },
}

fn interpret_event(event: &StripeEvent) -> Option<WebhookAction> {
    let object = &event.data.object;
    let str_field = |path: &[&str]| -> Option<String> {
        let mut value = object;
        for key in path {
            value = value.get(*key)?;
        }
        value.as_str().map(str::to_string)
    };

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let uid = str_field(&["client_reference_id"])
                .or_else(|| str_field(&["metadata", "uid"]))?;
            let tier = match str_field(&["metadata", "tier"])?.parse::<Tier>() {
                Ok(tier) => tier,
                Err(e) => {
                    warn!("Stripe event {} has bad tier metadata: {e}", event.id);
                    return None;
                }
            };
            Some(WebhookAction::Activate {
                uid,
                tier,
                customer_id: str_field(&["customer"]),
            })
        }
        "customer.subscription.deleted" => Some(WebhookAction::Cancel {
            customer_id: str_field(&["customer"])?,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::stripe::EventData;
    use serde_json::json;

    #[test]
    fn test_event_id_shape() {
        assert!(is_event_id("evt_1NqA2bC3dE4f"));
        assert!(is_event_id("evt_test_abc123"));
        assert!(!is_event_id("evt_"));
        assert!(!is_event_id("cs_123"));
        assert!(!is_event_id("evt_../../customers/cus_1"));
        assert!(!is_event_id("evt_1?expand[]=data"));
        assert!(!is_event_id("evt_1#x"));
        assert!(!is_event_id(&format!("evt_{}", "a".repeat(300))));
    }

    fn event(event_type: &str, object: serde_json::Value) -> StripeEvent {
        StripeEvent {
            id: "evt_1".to_string(),
            event_type: event_type.to_string(),
            data: EventData { object },
        }
    }

    #[test]
    fn test_checkout_completed_activates_tier() {
        let action = interpret_event(&event(
            "checkout.session.completed",
            json!({"client_reference_id": "uid_1", "customer": "cus_1", "metadata": {"tier": "pro"}}),
        ));
        assert_eq!(
            action,
            Some(WebhookAction::Activate {
                uid: "uid_1".to_string(),
                tier: Tier::Pro,
                customer_id: Some("cus_1".to_string()),
            })
        );
    }

    #[test]
    fn test_checkout_falls_back_to_metadata_uid() {
        let action = interpret_event(&event(
            "checkout.session.completed",
            json!({"metadata": {"tier": "elite", "uid": "uid_2"}}),
        ));
        assert!(matches!(
            action,
            Some(WebhookAction::Activate { ref uid, tier: Tier::Elite, customer_id: None }) if uid == "uid_2"
        ));
    }

    #[test]
    fn test_bad_tier_metadata_is_ignored() {
        let action = interpret_event(&event(
            "checkout.session.completed",
            json!({"client_reference_id": "uid_1", "metadata": {"tier": "platinum"}}),
        ));
        assert_eq!(action, None);
    }

    #[test]
    fn test_subscription_deleted_cancels() {
        let action = interpret_event(&event(
            "customer.subscription.deleted",
            json!({"customer": "cus_7"}),
        ));
        assert_eq!(
            action,
            Some(WebhookAction::Cancel {
                customer_id: "cus_7".to_string()
            })
        );
    }

    #[test]
    fn test_unrelated_events_ignored() {
        assert_eq!(interpret_event(&event("invoice.paid", json!({}))), None);
    }

    #[test]
    fn test_credit_summary_reports_limits_for_tier() {
        let mut account = Account::new(Tier::Free, "2026-10");
        account.coffee_chat_preps_used = 2;
        let summary = CreditSummary::from(&account);
        let coffee = summary
            .usage
            .iter()
            .find(|u| u.feature == Feature::CoffeeChatPrep)
            .unwrap();
        assert_eq!(coffee.used, 2);
        assert_eq!(coffee.limit, Some(3));
        assert_eq!(summary.max_credits, 300);

        let elite = CreditSummary::from(&Account::new(Tier::Elite, "2026-10"));
        assert!(elite.usage.iter().all(|u| u.limit.is_none()));
    }
}
