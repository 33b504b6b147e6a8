//! Daily.co adapter. Implements MeetingProviderPort by creating rooms via the REST API.

use crate::domain::DomainError;
use crate::ports::{MeetingProviderPort, MeetingRoom};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const DAILY_ROOMS_URL: &str = "https://api.daily.co/v1/rooms";

/// Daily.co API adapter.
///
/// Rooms are private; `nbf`/`exp` bound when participants can join.
pub struct DailyAdapter {
    client: Client,
    api_key: String,
}

impl DailyAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    fn room_body(name: &str, starts_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "privacy": "private",
            "properties": {
                "nbf": starts_at.timestamp(),
                "exp": expires_at.timestamp(),
                "enable_chat": true,
                "enable_screenshare": true,
            }
        })
    }
}

#[derive(Deserialize)]
struct RoomResponse {
    name: String,
    url: String,
}

#[async_trait::async_trait]
impl MeetingProviderPort for DailyAdapter {
    async fn create_room(
        &self,
        name: &str,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<MeetingRoom, DomainError> {
        let res = self
            .client
            .post(DAILY_ROOMS_URL)
            .bearer_auth(&self.api_key)
            .json(&Self::room_body(name, starts_at, expires_at))
            .send()
            .await
            .map_err(|e| DomainError::Meeting(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::Meeting(format!(
                "Daily API error {}: {}",
                status, text
            )));
        }

        let room: RoomResponse = res
            .json()
            .await
            .map_err(|e| DomainError::Meeting(format!("Failed to parse room: {}", e)))?;
        info!(room = %room.name, "Daily room created");
        Ok(MeetingRoom {
            name: room.name,
            url: room.url,
        })
    }

    async fn delete_room(&self, name: &str) -> Result<(), DomainError> {
        let res = self
            .client
            .delete(format!("{DAILY_ROOMS_URL}/{name}"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::Meeting(format!("Request failed: {}", e)))?;
        if !res.status().is_success() && res.status() != reqwest::StatusCode::NOT_FOUND {
            warn!(room = name, status = %res.status(), "Daily room delete failed");
            return Err(DomainError::Meeting(format!(
                "Daily API error {}",
                res.status()
            )));
        }
        Ok(())
    }
}
