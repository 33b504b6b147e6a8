//! Payment gateway outbound port. Create hosted checkouts and confirm their outcome.

use crate::domain::{DomainError, Gateway, Millimes};
use uuid::Uuid;

/// Data the gateway needs to open a hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Our payment id, echoed back by the gateway as order/tracking id.
    pub payment_id: Uuid,
    pub amount: Millimes,
    pub description: String,
    pub customer_email: String,
    pub customer_name: String,
}

/// Hosted checkout created by the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Gateway-side reference (Paymee token, Flouci payment id).
    pub gateway_ref: String,
    pub payment_url: String,
}

/// Callback received from a gateway, normalised across providers.
#[derive(Debug, Clone, Default)]
pub struct GatewayNotification {
    pub gateway_ref: String,
    /// Status claimed by the callback itself, if it carries one.
    pub reported_success: Option<bool>,
    /// Signature over the callback fields, if the gateway signs them.
    pub checksum: Option<String>,
    pub transaction_id: Option<String>,
}

/// Authoritative outcome after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayVerdict {
    Paid,
    Failed,
    /// Not settled yet; leave the payment pending.
    Pending,
}

#[async_trait::async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    fn gateway(&self) -> Gateway;

    /// Open a hosted checkout for `request`.
    ///
    /// # Errors
    /// `DomainError::Gateway` when the API call fails or is rejected.
    async fn create_checkout(&self, request: &CheckoutRequest)
    -> Result<CheckoutSession, DomainError>;

    /// Verify a callback and return the authoritative outcome.
    ///
    /// # Errors
    /// `DomainError::InvalidSignature` when the callback signature does not match.
    async fn confirm(&self, notification: &GatewayNotification)
    -> Result<GatewayVerdict, DomainError>;
}
