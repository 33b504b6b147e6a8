//! Local meeting adapter for development without a Daily.co key.
//!
//! Returns deterministic room URLs under a configurable base; nothing is created remotely.

use crate::domain::DomainError;
use crate::ports::{MeetingProviderPort, MeetingRoom};
use chrono::{DateTime, Utc};
use tracing::info;

pub struct LocalMeetingAdapter {
    base_url: String,
}

impl LocalMeetingAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for LocalMeetingAdapter {
    fn default() -> Self {
        Self::new("http://localhost:3000/meet")
    }
}

#[async_trait::async_trait]
impl MeetingProviderPort for LocalMeetingAdapter {
    async fn create_room(
        &self,
        name: &str,
        starts_at: DateTime<Utc>,
        _expires_at: DateTime<Utc>,
    ) -> Result<MeetingRoom, DomainError> {
        info!(room = name, starts_at = %starts_at, "[LOCAL] meeting room registered");
        Ok(MeetingRoom {
            name: name.to_string(),
            url: format!("{}/{}", self.base_url, name),
        })
    }

    async fn delete_room(&self, name: &str) -> Result<(), DomainError> {
        info!(room = name, "[LOCAL] meeting room removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_room_url() {
        let adapter = LocalMeetingAdapter::new("http://localhost:3000/meet/");
        let now = Utc::now();
        let room = adapter.create_room("lh-1", now, now).await.unwrap();
        assert_eq!(room.url, "http://localhost:3000/meet/lh-1");
    }
}
