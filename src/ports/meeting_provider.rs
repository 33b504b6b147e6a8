//! Video meeting outbound port (Daily.co rooms).

use crate::domain::DomainError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MeetingRoom {
    pub name: String,
    pub url: String,
}

#[async_trait::async_trait]
pub trait MeetingProviderPort: Send + Sync {
    /// Create a room usable from `starts_at` until `expires_at`.
    async fn create_room(
        &self,
        name: &str,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<MeetingRoom, DomainError>;

    async fn delete_room(&self, name: &str) -> Result<(), DomainError>;
}
