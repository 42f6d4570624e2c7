//! Provisioning Pipeline Integration Tests
//!
//! End-to-end tests for the payment-to-account pipeline against an
//! in-memory SQLite store: cashier registration, webhook clearance,
//! matricule assignment, and credential delivery flags.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use uos_platform::domain::{AuditAction, Matricule, Payment, PaymentStatus};
use uos_platform::error::PlatformError;
use uos_platform::repository::{
    init_schema, AuditLogRepository, CampusRepository, MatriculeCounterRepository,
    PaymentRepository, UserRepository,
};
use uos_platform::service::{
    AuditService, ClearanceOutcome, DevDataSeeder, NotificationService, PasswordService,
    ProvisioningConfig, ProvisioningService, RegisterPaymentCommand,
};

struct TestContext {
    pool: SqlitePool,
    provisioning: Arc<ProvisioningService>,
    payments: Arc<PaymentRepository>,
    users: Arc<UserRepository>,
    audit_logs: Arc<AuditLogRepository>,
    password: PasswordService,
}

async fn setup() -> TestContext {
    // A single connection keeps every task on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();

    let payments = Arc::new(PaymentRepository::new(pool.clone()));
    let users = Arc::new(UserRepository::new(pool.clone()));
    let campuses = Arc::new(CampusRepository::new(pool.clone()));
    let audit_logs = Arc::new(AuditLogRepository::new(pool.clone()));

    DevDataSeeder::new(campuses).seed().await.unwrap();

    let provisioning = Arc::new(ProvisioningService::new(
        pool.clone(),
        payments.clone(),
        Arc::new(PasswordService::new(4)),
        Arc::new(NotificationService::log_only()),
        AuditService::new(audit_logs.clone()),
        ProvisioningConfig::default(),
    ));

    TestContext {
        pool,
        provisioning,
        payments,
        users,
        audit_logs,
        password: PasswordService::new(4),
    }
}

fn register_cmd(name: &str, reference: &str) -> RegisterPaymentCommand {
    RegisterPaymentCommand {
        student_name: name.to_string(),
        personal_email: "student@mail.test".to_string(),
        phone_number: "+237650000001".to_string(),
        amount: 50_000,
        payment_reference: reference.to_string(),
        campus: None,
    }
}

async fn insert_payment(ctx: &TestContext, payment: &Payment) {
    ctx.payments.insert(payment).await.unwrap();
}

mod cashier_registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_registration_provisions_account() {
        let ctx = setup().await;

        let account = ctx
            .provisioning
            .register_payment(register_cmd("Jane Doe", "PAY001"))
            .await
            .unwrap();

        // Matricule: 2-digit year prefix + 5-digit sequence
        let matricule = account.matricule.as_str();
        assert_eq!(matricule.len(), 7);
        assert!(matricule.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(account.matricule.year_prefix(), Matricule::current_year_prefix());

        // First registration of the name gets the undecorated email
        assert_eq!(account.user.institutional_email, "jane.doe@university.edu");
        assert_eq!(account.user.full_name, "Jane Doe");
        assert!(account.user.is_active);
        assert!(account.user.campus_id_home.is_some());

        // Payment committed as cleared and linked one-to-one
        let payment = ctx
            .payments
            .find_by_external_ref("PAY001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Cleared);
        assert!(payment.cleared_at.is_some());
        assert_eq!(payment.student_matricule.as_deref(), Some(matricule));
        assert_eq!(
            account.user.created_from_payment_id.as_deref(),
            Some(payment.id.as_str())
        );

        // The returned temporary password verifies against the stored hash
        let stored = ctx
            .users
            .find_by_institutional_email("jane.doe@university.edu")
            .await
            .unwrap()
            .unwrap();
        assert!(ctx
            .password
            .verify(&account.temporary_password, &stored.password_hash)
            .unwrap());

        // Delivery flags persisted after dispatch
        assert!(payment.email_sent);
        assert!(payment.sms_sent);
        assert!(payment.whatsapp_sent);
        assert!(payment.credentials_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let ctx = setup().await;

        ctx.provisioning
            .register_payment(register_cmd("Jane Doe", "PAY001"))
            .await
            .unwrap();

        let err = ctx
            .provisioning
            .register_payment(register_cmd("John Roe", "PAY001"))
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::Duplicate { .. }));

        // No second payment or user was created
        assert_eq!(ctx.users.count().await.unwrap(), 1);
        assert!(ctx
            .users
            .find_by_institutional_email("john.roe@university.edu")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_colliding_names_get_disambiguated_emails() {
        let ctx = setup().await;

        let first = ctx
            .provisioning
            .register_payment(register_cmd("John Smith", "PAY-A"))
            .await
            .unwrap();
        let second = ctx
            .provisioning
            .register_payment(register_cmd("John Smith", "PAY-B"))
            .await
            .unwrap();

        assert_eq!(first.user.institutional_email, "john.smith@university.edu");

        let expected = format!(
            "john.smith{}@university.edu",
            second.matricule.disambiguation_suffix()
        );
        assert_eq!(second.user.institutional_email, expected);
        assert_ne!(first.user.institutional_email, second.user.institutional_email);
        assert_eq!(ctx.users.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_matricule_sequence_strictly_increases() {
        let ctx = setup().await;
        let year = Matricule::current_year_prefix();

        for expected in 1..=4u32 {
            let account = ctx
                .provisioning
                .register_payment(register_cmd(
                    &format!("Student Number{expected}"),
                    &format!("PAY-{expected}"),
                ))
                .await
                .unwrap();

            assert_eq!(account.matricule.year_prefix(), year);
            assert_eq!(account.matricule.sequence(), expected);
        }
    }

    #[tokio::test]
    async fn test_concurrent_registrations_never_share_a_matricule() {
        let ctx = setup().await;

        let mut handles = Vec::new();
        for i in 0..6 {
            let provisioning = ctx.provisioning.clone();
            handles.push(tokio::spawn(async move {
                provisioning
                    .register_payment(register_cmd(
                        &format!("Racer Number{i}"),
                        &format!("RACE-{i}"),
                    ))
                    .await
                    .unwrap()
            }));
        }

        let mut matricules = std::collections::HashSet::new();
        let mut emails = std::collections::HashSet::new();
        for handle in handles {
            let account = handle.await.unwrap();
            matricules.insert(account.matricule.as_str().to_string());
            emails.insert(account.user.institutional_email);
        }

        assert_eq!(matricules.len(), 6);
        assert_eq!(emails.len(), 6);
    }

    #[tokio::test]
    async fn test_invalid_campus_rejected_before_any_write() {
        let ctx = setup().await;

        let mut cmd = register_cmd("Jane Doe", "PAY001");
        cmd.campus = Some("moon-base".to_string());

        let err = ctx.provisioning.register_payment(cmd).await.unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
        assert_eq!(err.to_string(), "Validation error: Invalid campus");

        // The whole transaction rolled back
        assert_eq!(ctx.users.count().await.unwrap(), 0);
        assert!(ctx
            .payments
            .find_by_external_ref("PAY001")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_counter_seeds_from_existing_emails() {
        let ctx = setup().await;
        let year = Matricule::current_year_prefix();

        // A pre-existing matricule-shaped account from an earlier deployment
        let existing = uos_platform::domain::User::new_student(
            format!("{year}00007@university.edu"),
            "Legacy Student",
            "$2b$04$legacyhash",
            "legacy-payment",
        );
        let mut conn = ctx.pool.acquire().await.unwrap();
        UserRepository::insert_tx(&mut conn, &existing).await.unwrap();
        drop(conn);

        let account = ctx
            .provisioning
            .register_payment(register_cmd("Jane Doe", "PAY001"))
            .await
            .unwrap();

        assert_eq!(account.matricule.sequence(), 8);
    }

    #[tokio::test]
    async fn test_sequence_exhaustion_rolls_back() {
        let ctx = setup().await;
        let year = Matricule::current_year_prefix();

        let mut conn = ctx.pool.acquire().await.unwrap();
        MatriculeCounterRepository::insert_tx(&mut conn, &year, 99_999)
            .await
            .unwrap();
        drop(conn);

        let err = ctx
            .provisioning
            .register_payment(register_cmd("Jane Doe", "PAY001"))
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::SequenceExhausted { .. }));
        assert_eq!(ctx.users.count().await.unwrap(), 0);
        assert!(ctx
            .payments
            .find_by_external_ref("PAY001")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_registration_is_audited() {
        let ctx = setup().await;

        let account = ctx
            .provisioning
            .register_payment(register_cmd("Jane Doe", "PAY001"))
            .await
            .unwrap();

        let logs = ctx.audit_logs.find_recent(10).await.unwrap();
        let entry = logs
            .iter()
            .find(|l| l.action == AuditAction::CreatedUserViaPayment)
            .expect("provisioning audit entry");

        assert_eq!(entry.user_id.as_deref(), Some(account.user.id.as_str()));
        let metadata = entry.metadata.as_ref().expect("metadata blob");
        assert_eq!(metadata["matricule"], account.matricule.as_str());
        assert_eq!(metadata["campus"], "town-a");
    }
}

mod api_tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use uos_platform::api::cashier::{register_payment, RegisterPaymentRequest};
    use uos_platform::api::payments::{payment_webhook, PaymentWebhookRequest};
    use uos_platform::api::{CashierState, PaymentsState};

    fn register_request(reference: &str) -> RegisterPaymentRequest {
        RegisterPaymentRequest {
            student_name: "Jane Doe".to_string(),
            personal_email: "jane@mail.test".to_string(),
            phone_number: "+237650000001".to_string(),
            amount: 50_000,
            payment_reference: reference.to_string(),
            campus: None,
        }
    }

    fn webhook_request(payment_id: &str, status: PaymentStatus) -> PaymentWebhookRequest {
        PaymentWebhookRequest {
            payment_id: payment_id.to_string(),
            external_ref: "GW-REF".to_string(),
            amount: 75_000,
            status,
            student_matricule: None,
        }
    }

    #[tokio::test]
    async fn test_register_endpoint_maps_duplicate_to_400() {
        let ctx = setup().await;
        let state = CashierState {
            provisioning: ctx.provisioning.clone(),
            payment_repo: ctx.payments.clone(),
        };

        let created =
            register_payment(State(state.clone()), Json(register_request("PAY001"))).await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let conflict =
            register_payment(State(state), Json(register_request("PAY001"))).await;
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(conflict.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "DUPLICATE_REFERENCE");
        assert_eq!(body["message"], "Payment reference already exists");
    }

    #[tokio::test]
    async fn test_register_endpoint_rejects_invalid_campus() {
        let ctx = setup().await;
        let state = CashierState {
            provisioning: ctx.provisioning.clone(),
            payment_repo: ctx.payments.clone(),
        };

        let mut request = register_request("PAY002");
        request.campus = Some("moon-base".to_string());

        let response = register_payment(State(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Invalid campus");
    }

    #[tokio::test]
    async fn test_webhook_always_acknowledges() {
        let ctx = setup().await;
        let state = PaymentsState {
            provisioning: ctx.provisioning.clone(),
        };

        let payment = Payment::new_pending("GW-ACK-1", 75_000).with_matricule("2600099");
        insert_payment(&ctx, &payment).await;

        // Successful clearance
        let ack = payment_webhook(
            State(state.clone()),
            Json(webhook_request(&payment.id, PaymentStatus::Cleared)),
        )
        .await;
        assert!(ack.0.received);

        // Unknown payment: internal error is swallowed, still acknowledged
        let ack = payment_webhook(
            State(state.clone()),
            Json(webhook_request("does-not-exist", PaymentStatus::Cleared)),
        )
        .await;
        assert!(ack.0.received);

        // Non-cleared status: acknowledged without side effect
        let ack = payment_webhook(
            State(state),
            Json(webhook_request(&payment.id, PaymentStatus::Failed)),
        )
        .await;
        assert!(ack.0.received);
    }
}

mod webhook_tests {
    use super::*;

    #[tokio::test]
    async fn test_clearance_creates_account_exactly_once() {
        let ctx = setup().await;

        let payment = Payment::new_pending("GW-REF-1", 75_000).with_matricule("2600042");
        insert_payment(&ctx, &payment).await;

        let first = ctx
            .provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();
        assert!(matches!(first, ClearanceOutcome::AccountCreated { .. }));

        let user = ctx
            .users
            .find_by_institutional_email("2600042@university.edu")
            .await
            .unwrap()
            .expect("webhook-provisioned account");
        assert!(user.is_active);
        assert_eq!(user.full_name, "Pending Name Registration");

        // Duplicate delivery is an idempotent no-op
        let second = ctx
            .provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();
        assert_eq!(second, ClearanceOutcome::AlreadyProvisioned);
        assert_eq!(ctx.users.count().await.unwrap(), 1);

        let stored = ctx.payments.find_by_id(&payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Cleared);
        assert!(stored.cleared_at.is_some());
    }

    #[tokio::test]
    async fn test_clearance_reactivates_inactive_account() {
        let ctx = setup().await;

        let payment = Payment::new_pending("GW-REF-2", 75_000).with_matricule("2600050");
        insert_payment(&ctx, &payment).await;

        ctx.provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();

        let user = ctx
            .users
            .find_by_institutional_email("2600050@university.edu")
            .await
            .unwrap()
            .unwrap();

        let mut conn = ctx.pool.acquire().await.unwrap();
        UserRepository::set_active_tx(&mut conn, &user.id, false)
            .await
            .unwrap();
        drop(conn);

        let outcome = ctx
            .provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ClearanceOutcome::Reactivated {
                user_id: user.id.clone()
            }
        );

        let reactivated = ctx.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(reactivated.is_active);
        assert_eq!(ctx.users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clearance_without_matricule_only_clears() {
        let ctx = setup().await;

        let payment = Payment::new_pending("GW-REF-3", 75_000);
        insert_payment(&ctx, &payment).await;

        let outcome = ctx
            .provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();
        assert_eq!(outcome, ClearanceOutcome::NoMatricule);

        let stored = ctx.payments.find_by_id(&payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Cleared);
        assert_eq!(ctx.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_payment_rejected() {
        let ctx = setup().await;

        let err = ctx
            .provisioning
            .handle_payment_cleared("does-not-exist")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_payment_rejected() {
        let ctx = setup().await;

        let mut payment = Payment::new_pending("GW-REF-4", 75_000).with_matricule("2600060");
        payment.transition(PaymentStatus::Failed).unwrap();
        insert_payment(&ctx, &payment).await;

        let err = ctx
            .provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidPaymentState { .. }));
        assert_eq!(ctx.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delivery_flags_recorded_for_webhook_account() {
        let ctx = setup().await;

        let payment = Payment::new_pending("GW-REF-5", 75_000)
            .with_matricule("2600070")
            .with_contact(Some("parent@mail.test".to_string()), None);
        insert_payment(&ctx, &payment).await;

        ctx.provisioning
            .handle_payment_cleared(&payment.id)
            .await
            .unwrap();

        let stored = ctx.payments.find_by_id(&payment.id).await.unwrap().unwrap();
        assert!(stored.email_sent);
        // No phone number on the payment: SMS and WhatsApp are skipped
        assert!(!stored.sms_sent);
        assert!(!stored.whatsapp_sent);
        assert!(stored.credentials_sent_at.is_some());
    }
}
