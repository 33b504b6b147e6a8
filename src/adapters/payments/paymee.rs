//! Paymee adapter. Implements PaymentGatewayPort via the Paymee v2 REST API.
//!
//! Checkout: `POST /api/v2/payments/create` with `Authorization: Token <key>`.
//! Webhook: form post carrying `token`, `payment_status` and `check_sum`, where
//! `check_sum = md5(token + ("1" | "0") + api_key)`.

use crate::domain::{DomainError, Gateway, Millimes};
use crate::ports::{
    CheckoutRequest, CheckoutSession, GatewayNotification, GatewayVerdict, PaymentGatewayPort,
};
use md5::{Digest, Md5};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const PAYMEE_LIVE_URL: &str = "https://app.paymee.tn";
const PAYMEE_SANDBOX_URL: &str = "https://sandbox.paymee.tn";

/// Where Paymee sends the customer and the webhook.
#[derive(Debug, Clone)]
pub struct PaymeeLinks {
    pub return_url: String,
    pub cancel_url: String,
    pub webhook_url: String,
}

pub struct PaymeeAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    links: PaymeeLinks,
}

impl PaymeeAdapter {
    /// Create a new Paymee adapter.
    ///
    /// # Arguments
    /// * `api_key` - Paymee API token (dashboard, "API" section)
    /// * `sandbox` - Use sandbox.paymee.tn
    /// * `links` - Return, cancel and webhook URLs sent with every checkout
    pub fn new(api_key: String, sandbox: bool, links: PaymeeLinks) -> Self {
        let base_url = if sandbox {
            PAYMEE_SANDBOX_URL
        } else {
            PAYMEE_LIVE_URL
        };
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            base_url: base_url.to_string(),
            api_key,
            links,
        }
    }

    /// Expected `check_sum` for a webhook.
    pub fn checksum(token: &str, paid: bool, api_key: &str) -> String {
        let flag = if paid { "1" } else { "0" };
        let digest = Md5::digest(format!("{token}{flag}{api_key}").as_bytes());
        format!("{:x}", digest)
    }

    fn split_name(full_name: &str) -> (String, String) {
        let mut parts = full_name.trim().splitn(2, ' ');
        let first = parts.next().unwrap_or_default().to_string();
        let last = parts.next().unwrap_or_default().trim().to_string();
        (first, last)
    }

    /// Paymee expects dinars with millime precision.
    fn dinars(amount: Millimes) -> f64 {
        amount as f64 / 1000.0
    }
}

#[derive(Serialize)]
struct CreatePaymentBody<'a> {
    amount: f64,
    note: &'a str,
    first_name: String,
    last_name: String,
    email: &'a str,
    phone: &'a str,
    return_url: &'a str,
    cancel_url: &'a str,
    webhook_url: &'a str,
    order_id: String,
}

#[derive(Deserialize)]
struct CreatePaymentResponse {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<CreatePaymentData>,
}

#[derive(Deserialize)]
struct CreatePaymentData {
    token: String,
    payment_url: String,
}

#[async_trait::async_trait]
impl PaymentGatewayPort for PaymeeAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Paymee
    }

    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError> {
        let (first_name, last_name) = Self::split_name(&request.customer_name);
        let body = CreatePaymentBody {
            amount: Self::dinars(request.amount),
            note: &request.description,
            first_name,
            last_name,
            email: &request.customer_email,
            phone: "",
            return_url: &self.links.return_url,
            cancel_url: &self.links.cancel_url,
            webhook_url: &self.links.webhook_url,
            order_id: request.payment_id.to_string(),
        };

        let res = self
            .client
            .post(format!("{}/api/v2/payments/create", self.base_url))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("Paymee request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            warn!(status = %status, body = %text, "Paymee returned error");
            return Err(DomainError::Gateway(format!(
                "Paymee API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: CreatePaymentResponse = res
            .json()
            .await
            .map_err(|e| DomainError::Gateway(format!("Paymee response parse failed: {}", e)))?;

        match (parsed.status, parsed.data) {
            (true, Some(data)) => {
                info!(payment_id = %request.payment_id, "Paymee checkout created");
                Ok(CheckoutSession {
                    gateway_ref: data.token,
                    payment_url: data.payment_url,
                })
            }
            _ => Err(DomainError::Gateway(format!(
                "Paymee rejected checkout: {}",
                parsed.message
            ))),
        }
    }

    async fn confirm(
        &self,
        notification: &GatewayNotification,
    ) -> Result<GatewayVerdict, DomainError> {
        let paid = notification.reported_success.unwrap_or(false);
        let expected = Self::checksum(&notification.gateway_ref, paid, &self.api_key);
        match notification.checksum.as_deref() {
            Some(received) if received.eq_ignore_ascii_case(&expected) => Ok(if paid {
                GatewayVerdict::Paid
            } else {
                GatewayVerdict::Failed
            }),
            _ => {
                warn!(token = %notification.gateway_ref, "Paymee checksum mismatch");
                Err(DomainError::InvalidSignature)
            }
        }
    }
}
