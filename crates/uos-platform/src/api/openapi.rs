//! OpenAPI Document

use utoipa::OpenApi;

use crate::api::audit_logs::AuditLogResponse;
use crate::api::cashier::{
    CashierStatsResponse, PaymentSummary, RegisterPaymentRequest, RegisterPaymentResponse,
    RegistrationData, UserSummary,
};
use crate::api::common::ApiError;
use crate::api::payments::{PaymentWebhookRequest, WebhookAck};
use crate::domain::PaymentStatus;
use crate::service::notifications::DeliveryOutcome;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UniOS Platform API",
        description = "Payment-to-account provisioning endpoints",
    ),
    paths(
        crate::api::cashier::register_payment,
        crate::api::cashier::cashier_stats,
        crate::api::payments::payment_webhook,
        crate::api::audit_logs::recent_audit_logs,
        crate::api::audit_logs::user_audit_logs,
    ),
    components(schemas(
        ApiError,
        RegisterPaymentRequest,
        RegisterPaymentResponse,
        RegistrationData,
        UserSummary,
        PaymentSummary,
        CashierStatsResponse,
        DeliveryOutcome,
        PaymentStatus,
        PaymentWebhookRequest,
        WebhookAck,
        AuditLogResponse,
    )),
    tags(
        (name = "cashier", description = "Counter-side registration"),
        (name = "payments", description = "Gateway webhook intake"),
        (name = "audit-logs", description = "Provisioning audit trail"),
    )
)]
pub struct PlatformApiDoc;
