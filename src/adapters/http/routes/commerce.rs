//! Books, checkout, gateway webhooks and payment history.

use crate::adapters::http::extract::CurrentUser;
use crate::adapters::http::state::SharedState;
use crate::domain::{Book, DomainError, Earnings, Gateway, Payment, PurchaseItem};
use crate::ports::GatewayNotification;
use crate::usecases::book_service::{BookAccess, NewBook};
use crate::usecases::payment_service::{CheckoutStarted, Settlement};
use axum::{
    Form, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

pub async fn create_book(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), DomainError> {
    let book = state.books.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn list_books(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Book>>, DomainError> {
    Ok(Json(state.books.list().await?))
}

pub async fn book_access(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookAccess>, DomainError> {
    Ok(Json(state.books.access(&user, id).await?))
}

pub async fn checkout(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(gateway): Path<Gateway>,
    Json(item): Json<PurchaseItem>,
) -> Result<(StatusCode, Json<CheckoutStarted>), DomainError> {
    let started = state.payments.checkout(&user, gateway, item).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// Paymee callback, form-encoded. Fields are optional so that incomplete callbacks get a
/// JSON error instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct PaymeeWebhook {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub check_sum: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

pub async fn paymee_webhook(
    State(state): State<SharedState>,
    Form(form): Form<PaymeeWebhook>,
) -> Result<Json<Settlement>, DomainError> {
    let token = form
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DomainError::validation("token is required"))?;
    info!(token = %token, order_id = ?form.order_id, "paymee webhook received");
    let Some(check_sum) = form.check_sum.filter(|c| !c.trim().is_empty()) else {
        warn!(token = %token, "paymee webhook without checksum");
        return Err(DomainError::InvalidSignature);
    };
    let notification = GatewayNotification {
        gateway_ref: token,
        reported_success: form.payment_status.as_deref().map(truthy),
        checksum: Some(check_sum),
        transaction_id: form.transaction_id,
    };
    Ok(Json(
        state
            .payments
            .handle_webhook(Gateway::Paymee, notification)
            .await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct FlouciWebhook {
    pub payment_id: Option<String>,
}

/// Flouci callback. The payment id arrives in a JSON body or as `?payment_id=`.
pub async fn flouci_webhook(
    State(state): State<SharedState>,
    Query(query): Query<FlouciWebhook>,
    body: Bytes,
) -> Result<Json<Settlement>, DomainError> {
    let from_body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<FlouciWebhook>(&body) {
            Ok(parsed) => parsed.payment_id,
            Err(e) => {
                warn!(error = %e, "flouci webhook body is not JSON");
                None
            }
        }
    };
    let payment_id = from_body
        .or(query.payment_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| DomainError::validation("payment_id is required"))?;
    info!(flouci_id = %payment_id, "flouci webhook received");
    let notification = GatewayNotification {
        gateway_ref: payment_id,
        ..Default::default()
    };
    Ok(Json(
        state
            .payments
            .handle_webhook(Gateway::Flouci, notification)
            .await?,
    ))
}

pub async fn list_payments(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Payment>>, DomainError> {
    Ok(Json(state.payments.list(&user).await?))
}

pub async fn earnings(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Earnings>, DomainError> {
    Ok(Json(state.payments.earnings(&user).await?))
}
