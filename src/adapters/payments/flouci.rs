//! Flouci adapter. Implements PaymentGatewayPort via the Flouci developers API.
//!
//! Checkout: `POST /api/generate_payment` (amount in millimes).
//! Confirmation: callbacks are unsigned, so the outcome is always fetched from
//! `GET /api/verify_payment/{payment_id}`.

use crate::domain::{DomainError, Gateway};
use crate::ports::{
    CheckoutRequest, CheckoutSession, GatewayNotification, GatewayVerdict, PaymentGatewayPort,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const FLOUCI_API_URL: &str = "https://developers.flouci.com/api";

/// Checkout session lifetime on the Flouci side.
const SESSION_TIMEOUT_SECS: u64 = 1200;

pub struct FlouciAdapter {
    client: Client,
    app_token: String,
    app_secret: String,
    success_link: String,
    fail_link: String,
}

impl FlouciAdapter {
    pub fn new(
        app_token: String,
        app_secret: String,
        success_link: String,
        fail_link: String,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            app_token,
            app_secret,
            success_link,
            fail_link,
        }
    }

    fn verdict_for(status: &str) -> GatewayVerdict {
        match status.to_ascii_uppercase().as_str() {
            "SUCCESS" => GatewayVerdict::Paid,
            "FAILURE" | "EXPIRED" | "CANCELED" | "CANCELLED" => GatewayVerdict::Failed,
            _ => GatewayVerdict::Pending,
        }
    }
}

#[derive(Serialize)]
struct GeneratePaymentBody<'a> {
    app_token: &'a str,
    app_secret: &'a str,
    amount: String,
    accept_card: &'a str,
    session_timeout_secs: u64,
    success_link: &'a str,
    fail_link: &'a str,
    developer_tracking_id: String,
}

#[derive(Deserialize)]
struct GeneratePaymentResponse {
    result: GeneratePaymentResult,
}

#[derive(Deserialize)]
struct GeneratePaymentResult {
    #[serde(default)]
    success: bool,
    payment_id: Option<String>,
    link: Option<String>,
}

#[derive(Deserialize)]
struct VerifyPaymentResponse {
    #[serde(default)]
    success: bool,
    result: Option<VerifyPaymentResult>,
}

#[derive(Deserialize)]
struct VerifyPaymentResult {
    status: String,
}

#[async_trait::async_trait]
impl PaymentGatewayPort for FlouciAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Flouci
    }

    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError> {
        let body = GeneratePaymentBody {
            app_token: &self.app_token,
            app_secret: &self.app_secret,
            amount: request.amount.to_string(),
            accept_card: "true",
            session_timeout_secs: SESSION_TIMEOUT_SECS,
            success_link: &self.success_link,
            fail_link: &self.fail_link,
            developer_tracking_id: request.payment_id.to_string(),
        };

        let res = self
            .client
            .post(format!("{FLOUCI_API_URL}/generate_payment"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("Flouci request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            warn!(status = %status, body = %text, "Flouci returned error");
            return Err(DomainError::Gateway(format!(
                "Flouci API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GeneratePaymentResponse = res
            .json()
            .await
            .map_err(|e| DomainError::Gateway(format!("Flouci response parse failed: {}", e)))?;

        match (parsed.result.success, parsed.result.payment_id, parsed.result.link) {
            (true, Some(payment_id), Some(link)) => {
                info!(payment_id = %request.payment_id, flouci_id = %payment_id, "Flouci checkout created");
                Ok(CheckoutSession {
                    gateway_ref: payment_id,
                    payment_url: link,
                })
            }
            _ => Err(DomainError::Gateway(
                "Flouci rejected checkout".to_string(),
            )),
        }
    }

    async fn confirm(
        &self,
        notification: &GatewayNotification,
    ) -> Result<GatewayVerdict, DomainError> {
        let res = self
            .client
            .get(format!(
                "{FLOUCI_API_URL}/verify_payment/{}",
                notification.gateway_ref
            ))
            .header("apppublic", &self.app_token)
            .header("appsecret", &self.app_secret)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("Flouci verify failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Flouci verify returned error");
            return Err(DomainError::Gateway(format!(
                "Flouci verify error {}",
                status
            )));
        }

        let parsed: VerifyPaymentResponse = res
            .json()
            .await
            .map_err(|e| DomainError::Gateway(format!("Flouci verify parse failed: {}", e)))?;

        if !parsed.success {
            warn!(flouci_id = %notification.gateway_ref, "Flouci verify reported success=false");
        }
        let verdict = parsed
            .result
            .map(|r| Self::verdict_for(&r.status))
            .unwrap_or(GatewayVerdict::Pending);
        info!(flouci_id = %notification.gateway_ref, ?verdict, "Flouci payment verified");
        Ok(verdict)
    }
}
