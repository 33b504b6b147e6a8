//! HTTP mailer. Implements MailerPort against a Resend-compatible `POST /emails` API.

use crate::domain::DomainError;
use crate::ports::MailerPort;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait::async_trait]
impl MailerPort for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "text": body,
        });

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::Mail(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::Mail(format!(
                "Mail API error {}: {}",
                status, text
            )));
        }

        debug!(to, subject, "mail sent");
        Ok(())
    }
}
