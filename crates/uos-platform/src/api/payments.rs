//! Payment Gateway Webhook
//!
//! The gateway notifies the platform when a previously pending payment
//! settles. The endpoint always acknowledges with `{received: true}` so
//! upstream retries do not hammer on application errors; internal failures
//! are logged, never surfaced.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::PaymentStatus;
use crate::service::provisioning::ProvisioningService;

/// Gateway webhook payload
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhookRequest {
    pub payment_id: String,

    pub external_ref: String,

    pub amount: i64,

    pub status: PaymentStatus,

    /// Matricule the gateway intake assigned, if any
    #[serde(default)]
    pub student_matricule: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

/// Payments service state
#[derive(Clone)]
pub struct PaymentsState {
    pub provisioning: Arc<ProvisioningService>,
}

/// Receive a payment status notification
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "payments",
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Notification acknowledged", body = WebhookAck),
    )
)]
pub async fn payment_webhook(
    State(state): State<PaymentsState>,
    Json(request): Json<PaymentWebhookRequest>,
) -> Json<WebhookAck> {
    info!(
        payment_id = %request.payment_id,
        external_ref = %request.external_ref,
        status = %request.status,
        "Received payment webhook"
    );

    if request.status == PaymentStatus::Cleared {
        if let Err(e) = state
            .provisioning
            .handle_payment_cleared(&request.payment_id)
            .await
        {
            error!(
                payment_id = %request.payment_id,
                error = %e,
                "Webhook clearance processing failed"
            );
        }
    }

    Json(WebhookAck { received: true })
}

/// Create the payments router
pub fn payments_router(state: PaymentsState) -> Router {
    Router::new()
        .route("/webhook", post(payment_webhook))
        .with_state(state)
}
