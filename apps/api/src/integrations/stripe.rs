//! Stripe — Checkout sessions for upgrades and event retrieval for webhooks.
//!
//! Webhook payloads are not trusted as delivered: the handler re-fetches the
//! event by id with the secret key, so only events Stripe actually holds are applied.

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::integrations::{http_client, read_json, IntegrationError};

const SERVICE: &str = "Stripe";
const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

/// Parameters for a subscription checkout.
pub struct CheckoutParams<'a> {
    pub price_id: &'a str,
    pub uid: &'a str,
    pub email: &'a str,
    pub tier: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            secret_key,
        })
    }

    pub async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CheckoutSession, IntegrationError> {
        let form = [
            ("mode", "subscription"),
            ("line_items[0][price]", params.price_id),
            ("line_items[0][quantity]", "1"),
            ("client_reference_id", params.uid),
            ("customer_email", params.email),
            ("metadata[uid]", params.uid),
            ("metadata[tier]", params.tier),
            ("subscription_data[metadata][uid]", params.uid),
            ("subscription_data[metadata][tier]", params.tier),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
        ];

        let response = self
            .client
            .post(format!("{API_BASE}/checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        read_json(SERVICE, response).await
    }

    pub async fn retrieve_event(&self, event_id: &str) -> Result<StripeEvent, IntegrationError> {
        let response = self
            .client
            .get(format!("{API_BASE}/events/{event_id}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(IntegrationError::http(SERVICE))?;

        read_json(SERVICE, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_parses_type_and_object() {
        let json = r#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": {"object": {"client_reference_id": "uid_1", "customer": "cus_9"}}
        }"#;
        let event: StripeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object["customer"], "cus_9");
    }
}
