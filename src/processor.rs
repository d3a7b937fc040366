// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Payment processor client.
//!
//! Thin wrapper over a PayPal-style Orders API: obtain a bearer token with the
//! configured client credentials, create an order for a tier's exact
//! amount/currency, and hand back the approval redirect URL plus order id.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ProcessorConfig;
use crate::tiers::Tier;

#[derive(Clone)]
pub struct ProcessorClient {
    config: ProcessorConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OrderRequest {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnitRequest>,
    application_context: ApplicationContext,
}

#[derive(Debug, Serialize)]
struct PurchaseUnitRequest {
    reference_id: String,
    description: String,
    amount: AmountRequest,
}

#[derive(Debug, Serialize)]
struct AmountRequest {
    currency_code: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    return_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<OrderLink>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLink {
    pub href: String,
    pub rel: String,
}

/// Result of a successful order creation: what the frontend needs to send the
/// member to the processor's approval page.
#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order_id: String,
    pub redirect_url: String,
}

impl ProcessorClient {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let url = format!("{}/v1/oauth2/token", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to request processor access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token request failed with status {}: {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        Ok(token.access_token)
    }

    /// Create an order for `tier`, attributed to `user_id`. Returns the order
    /// id and the approval redirect URL.
    pub async fn create_order(&self, tier: &Tier, user_id: &str) -> Result<CreatedOrder> {
        let token = self.access_token().await?;

        let request = OrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitRequest {
                reference_id: user_id.to_string(),
                description: tier.description.to_string(),
                amount: AmountRequest {
                    currency_code: tier.currency.to_string(),
                    value: tier.amount.to_string(),
                },
            }],
            application_context: ApplicationContext {
                return_url: self.config.return_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
            },
        };

        let url = format!("{}/v2/checkout/orders", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .context("Failed to create processor order")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Order creation failed with status {}: {}", status, body);
        }

        let order: OrderResponse = response
            .json()
            .await
            .context("Failed to parse order response")?;

        let redirect_url = approval_link(&order)
            .context("Order response carried no approval link")?
            .to_string();

        tracing::info!(
            order_id = %order.id,
            tier = tier.id,
            "Created processor order"
        );

        Ok(CreatedOrder {
            order_id: order.id,
            redirect_url,
        })
    }
}

/// Pick the approval redirect out of the order's HATEOAS links.
fn approval_link(order: &OrderResponse) -> Option<&str> {
    order
        .links
        .iter()
        .find(|l| l.rel == "approve" || l.rel == "payer-action")
        .map(|l| l.href.as_str())
}
