//! Cashier API Endpoints
//!
//! Counter-side registration: a cleared tuition payment goes in, a
//! provisioned student account with temporary credentials comes out.
//! - POST /cashier/register-payment
//! - GET /cashier/stats

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::api::common::{bad_request, ApiError};
use crate::error::{PlatformError, Result};
use crate::repository::PaymentRepository;
use crate::service::notifications::DeliveryOutcome;
use crate::service::provisioning::{
    ProvisionedAccount, ProvisioningService, RegisterPaymentCommand,
};

/// Registration request from the cashier counter
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentRequest {
    /// Student display name
    pub student_name: String,

    /// Personal email for credential delivery
    pub personal_email: String,

    /// Phone number for SMS/WhatsApp delivery
    pub phone_number: String,

    /// Amount in whole currency units
    pub amount: i64,

    /// Globally unique payment reference
    pub payment_reference: String,

    /// Campus slug; the home campus is used when omitted
    #[serde(default)]
    pub campus: Option<String>,
}

impl RegisterPaymentRequest {
    /// Field-level checks run before any store access.
    fn validate(self) -> Result<RegisterPaymentCommand> {
        if self.student_name.trim().is_empty() {
            return Err(PlatformError::validation("studentName must not be empty"));
        }
        if !self.personal_email.contains('@') {
            return Err(PlatformError::validation("personalEmail must be an email address"));
        }
        if self.payment_reference.trim().is_empty() {
            return Err(PlatformError::validation("paymentReference must not be empty"));
        }
        if self.amount <= 0 {
            return Err(PlatformError::validation("amount must be positive"));
        }

        Ok(RegisterPaymentCommand {
            student_name: self.student_name.trim().to_string(),
            personal_email: self.personal_email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            amount: self.amount,
            payment_reference: self.payment_reference.trim().to_string(),
            campus: self.campus,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentResponse {
    pub success: bool,
    pub message: String,
    pub data: RegistrationData,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub user: UserSummary,
    pub payment: PaymentSummary,
    pub notifications: DeliveryOutcome,
    /// Returned in the response as the fallback delivery path
    pub temporary_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub institutional_email: String,
    pub matricule: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub id: String,
    pub reference: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashierStatsResponse {
    pub today_registrations: i64,
    pub pending_payments: i64,
    pub total_revenue: i64,
}

impl From<ProvisionedAccount> for RegistrationData {
    fn from(account: ProvisionedAccount) -> Self {
        Self {
            user: UserSummary {
                id: account.user.id,
                full_name: account.user.full_name,
                institutional_email: account.user.institutional_email,
                matricule: account.matricule.as_str().to_string(),
            },
            payment: PaymentSummary {
                id: account.payment.id,
                reference: account.payment.external_ref,
                amount: account.payment.amount,
            },
            notifications: account.notifications,
            temporary_password: account.temporary_password,
        }
    }
}

/// Cashier service state
#[derive(Clone)]
pub struct CashierState {
    pub provisioning: Arc<ProvisioningService>,
    pub payment_repo: Arc<PaymentRepository>,
}

/// Register a student payment and auto-create the account
#[utoipa::path(
    post,
    path = "/register-payment",
    tag = "cashier",
    request_body = RegisterPaymentRequest,
    responses(
        (status = 201, description = "Student registered", body = RegisterPaymentResponse),
        (status = 400, description = "Duplicate reference or invalid input", body = ApiError),
    )
)]
pub async fn register_payment(
    State(state): State<CashierState>,
    Json(request): Json<RegisterPaymentRequest>,
) -> Response {
    info!(student = %request.student_name, "New payment registration");

    let cmd = match request.validate() {
        Ok(cmd) => cmd,
        Err(e) => return e.into_response(),
    };

    match state.provisioning.register_payment(cmd).await {
        Ok(account) => {
            let response = RegisterPaymentResponse {
                success: true,
                message: "Student registered successfully. Credentials sent via Email, SMS, and WhatsApp."
                    .to_string(),
                data: account.into(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(PlatformError::Duplicate { entity_type, .. }) if entity_type == "Payment" => {
            bad_request("DUPLICATE_REFERENCE", "Payment reference already exists")
        }
        Err(e) => e.into_response(),
    }
}

/// Aggregate counters for the cashier dashboard
#[utoipa::path(
    get,
    path = "/stats",
    tag = "cashier",
    responses(
        (status = 200, description = "Cashier dashboard stats", body = CashierStatsResponse),
    )
)]
pub async fn cashier_stats(
    State(state): State<CashierState>,
) -> std::result::Result<Json<CashierStatsResponse>, PlatformError> {
    let start_of_day = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now);

    let today_registrations = state.payment_repo.count_cleared_since(start_of_day).await?;
    let pending_payments = state.payment_repo.count_pending().await?;
    let total_revenue = state.payment_repo.total_cleared_amount().await?;

    Ok(Json(CashierStatsResponse {
        today_registrations,
        pending_payments,
        total_revenue,
    }))
}

/// Create the cashier router
pub fn cashier_router(state: CashierState) -> Router {
    Router::new()
        .route("/register-payment", post(register_payment))
        .route("/stats", get(cashier_stats))
        .with_state(state)
}
