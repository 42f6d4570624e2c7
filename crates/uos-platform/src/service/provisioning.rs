//! Account Provisioning
//!
//! The payment-to-account state machine. Two entry points drive it: cashier
//! registration (payment recorded and cleared in one step) and the payment
//! gateway webhook (a pending payment clears asynchronously).
//!
//! All durable writes for one provisioning happen inside a single store
//! transaction: the duplicate-reference check, the matricule counter bump,
//! and the payment + user inserts either all commit or all roll back.
//! Notification dispatch, delivery-flag updates, and audit recording run
//! after the commit and are best-effort.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{AuditAction, AuditLog, Matricule, Payment, PaymentStatus, User};
use crate::error::{PlatformError, Result};
use crate::repository::{CampusRepository, PaymentRepository, UserRepository};
use crate::service::audit::AuditService;
use crate::service::identity::{self, MatriculeGenerator};
use crate::service::notifications::{CredentialNotification, DeliveryOutcome, NotificationService};
use crate::service::password::PasswordService;

#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Institutional email domain
    pub email_domain: String,
    /// Campus assigned when the caller does not name one
    pub default_campus_slug: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            email_domain: "university.edu".to_string(),
            default_campus_slug: "town-a".to_string(),
        }
    }
}

/// Validated cashier registration input.
#[derive(Debug, Clone)]
pub struct RegisterPaymentCommand {
    pub student_name: String,
    pub personal_email: String,
    pub phone_number: String,
    pub amount: i64,
    pub payment_reference: String,
    pub campus: Option<String>,
}

/// Everything the cashier gets back after a successful registration.
#[derive(Debug)]
pub struct ProvisionedAccount {
    pub user: User,
    pub payment: Payment,
    pub matricule: Matricule,
    pub notifications: DeliveryOutcome,
    pub temporary_password: String,
}

/// What a webhook clearance ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearanceOutcome {
    /// A new account was created and credentials dispatched
    AccountCreated { user_id: String },
    /// An inactive account was reactivated; no new credentials
    Reactivated { user_id: String },
    /// The account already exists and is active; nothing to do
    AlreadyProvisioned,
    /// The payment carries no matricule, so no account can be derived
    NoMatricule,
}

pub struct ProvisioningService {
    pool: SqlitePool,
    payments: Arc<PaymentRepository>,
    password_service: Arc<PasswordService>,
    notifications: Arc<NotificationService>,
    audit: AuditService,
    config: ProvisioningConfig,
}

impl ProvisioningService {
    pub fn new(
        pool: SqlitePool,
        payments: Arc<PaymentRepository>,
        password_service: Arc<PasswordService>,
        notifications: Arc<NotificationService>,
        audit: AuditService,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            pool,
            payments,
            password_service,
            notifications,
            audit,
            config,
        }
    }

    /// Cashier path: record a cleared payment and provision the account in
    /// one atomic step.
    pub async fn register_payment(&self, cmd: RegisterPaymentCommand) -> Result<ProvisionedAccount> {
        let mut tx = self.pool.begin().await?;

        // Reference pre-check gives the caller a clean conflict message; the
        // UNIQUE index still backstops races that slip past it.
        if PaymentRepository::find_by_external_ref_tx(&mut tx, &cmd.payment_reference)
            .await?
            .is_some()
        {
            return Err(PlatformError::duplicate(
                "Payment",
                "externalRef",
                &cmd.payment_reference,
            ));
        }

        let year_prefix = Matricule::current_year_prefix();
        let matricule = MatriculeGenerator::next(&mut tx, &year_prefix).await?;

        let base_email = identity::email_from_name(&cmd.student_name, &self.config.email_domain, None);
        let institutional_email =
            if UserRepository::institutional_email_exists_tx(&mut tx, &base_email).await? {
                identity::email_from_name(
                    &cmd.student_name,
                    &self.config.email_domain,
                    Some(matricule.disambiguation_suffix()),
                )
            } else {
                base_email
            };

        let temporary_password = identity::password_from_name(&cmd.student_name);
        let password_hash = self.password_service.hash(&temporary_password)?;

        let campus_slug = cmd
            .campus
            .as_deref()
            .unwrap_or(&self.config.default_campus_slug);
        let campus = CampusRepository::find_by_slug_tx(&mut tx, campus_slug)
            .await?
            .ok_or_else(|| PlatformError::validation("Invalid campus"))?;

        let payment = Payment::new_cleared(
            &cmd.payment_reference,
            matricule.as_str(),
            &cmd.student_name,
            &cmd.personal_email,
            &cmd.phone_number,
            cmd.amount,
        );
        PaymentRepository::insert_tx(&mut tx, &payment).await?;

        let user = User::new_student(
            &institutional_email,
            &cmd.student_name,
            &password_hash,
            &payment.id,
        )
        .with_contact(
            Some(cmd.personal_email.clone()),
            Some(cmd.phone_number.clone()),
        )
        .with_campus(&campus.id);
        UserRepository::insert_tx(&mut tx, &user).await?;

        tx.commit().await?;

        info!(
            user_id = %user.id,
            email = %institutional_email,
            matricule = %matricule,
            "Created user account from payment"
        );

        let notifications = self
            .notifications
            .send_credentials(&CredentialNotification {
                full_name: cmd.student_name.clone(),
                institutional_email: institutional_email.clone(),
                personal_email: cmd.personal_email.clone(),
                phone: Some(cmd.phone_number.clone()),
                temporary_password: temporary_password.clone(),
            })
            .await;

        let payment = self
            .record_delivery(payment, &notifications)
            .await;

        self.audit
            .record(
                AuditLog::new(
                    AuditAction::CreatedUserViaPayment,
                    format!("Created user account via payment ref {}", payment.id),
                )
                .with_user(&user.id)
                .with_metadata(serde_json::json!({
                    "matricule": matricule.as_str(),
                    "paymentAmount": payment.amount.to_string(),
                    "campus": campus.slug,
                    "paymentId": payment.id,
                })),
            )
            .await;

        Ok(ProvisionedAccount {
            user,
            payment,
            matricule,
            notifications,
            temporary_password,
        })
    }

    /// Webhook path: a previously recorded payment has cleared. Idempotent
    /// with respect to duplicate deliveries.
    pub async fn handle_payment_cleared(&self, payment_id: &str) -> Result<ClearanceOutcome> {
        info!(payment_id, "Processing cleared payment");

        let mut tx = self.pool.begin().await?;

        let mut payment = PaymentRepository::find_by_id_tx(&mut tx, payment_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Payment", payment_id))?;

        let newly_cleared = match payment.status {
            PaymentStatus::Pending => {
                payment.transition(PaymentStatus::Cleared)?;
                PaymentRepository::update_status_tx(
                    &mut tx,
                    &payment.id,
                    PaymentStatus::Cleared,
                    payment.cleared_at,
                )
                .await?;
                true
            }
            // Duplicate webhook delivery; the steps below are no-ops when
            // the account already exists.
            PaymentStatus::Cleared => false,
            PaymentStatus::Failed => {
                return Err(PlatformError::InvalidPaymentState {
                    id: payment.id.clone(),
                    status: payment.status.to_string(),
                });
            }
        };

        let Some(matricule_str) = payment.student_matricule.clone() else {
            tx.commit().await?;
            return Ok(ClearanceOutcome::NoMatricule);
        };
        let matricule = Matricule::parse(&matricule_str)?;

        // The matricule is the uniqueness key on this path, so the email is
        // derived deterministically with no disambiguation step.
        let institutional_email = format!("{}@{}", matricule, self.config.email_domain);

        let outcome = match UserRepository::find_by_institutional_email_tx(&mut tx, &institutional_email)
            .await?
        {
            Some(user) if !user.is_active => {
                UserRepository::set_active_tx(&mut tx, &user.id, true).await?;
                tx.commit().await?;

                info!(user_id = %user.id, "Reactivated account for cleared payment");
                self.audit
                    .record(
                        AuditLog::new(
                            AuditAction::UserReactivated,
                            format!("Reactivated account via payment ref {}", payment.id),
                        )
                        .with_user(&user.id),
                    )
                    .await;
                ClearanceOutcome::Reactivated { user_id: user.id }
            }
            Some(_) => {
                tx.commit().await?;
                ClearanceOutcome::AlreadyProvisioned
            }
            None => {
                info!(matricule = %matricule, "Creating account for cleared payment");

                let temporary_password = identity::opaque_password();
                let password_hash = self.password_service.hash(&temporary_password)?;

                // The student's name is not known until they complete their
                // profile; the matricule-derived email is the identity.
                let user = User::new_student(
                    &institutional_email,
                    "Pending Name Registration",
                    &password_hash,
                    &payment.id,
                )
                .with_contact(payment.personal_email.clone(), payment.phone_number.clone());
                UserRepository::insert_tx(&mut tx, &user).await?;

                tx.commit().await?;

                let notifications = self
                    .notifications
                    .send_credentials(&CredentialNotification {
                        full_name: user.full_name.clone(),
                        institutional_email: institutional_email.clone(),
                        personal_email: payment
                            .personal_email
                            .clone()
                            .unwrap_or_else(|| institutional_email.clone()),
                        phone: payment.phone_number.clone(),
                        temporary_password,
                    })
                    .await;

                let payment_after = self.record_delivery(payment.clone(), &notifications).await;

                self.audit
                    .record(
                        AuditLog::new(
                            AuditAction::CreatedUserViaPayment,
                            format!("Created user account via payment ref {}", payment_after.id),
                        )
                        .with_user(&user.id)
                        .with_metadata(serde_json::json!({
                            "matricule": matricule.as_str(),
                            "paymentAmount": payment_after.amount.to_string(),
                            "paymentId": payment_after.id,
                        })),
                    )
                    .await;

                ClearanceOutcome::AccountCreated { user_id: user.id }
            }
        };

        if newly_cleared {
            self.audit
                .record(AuditLog::new(
                    AuditAction::PaymentCleared,
                    format!("Payment {} cleared", payment_id),
                ))
                .await;
        }

        Ok(outcome)
    }

    /// Persist delivery flags after dispatch. Failures here are logged, not
    /// propagated: the account is already committed and credentials remain
    /// retrievable through support channels.
    async fn record_delivery(&self, mut payment: Payment, outcome: &DeliveryOutcome) -> Payment {
        let sent_at = Utc::now();
        if let Err(e) = self
            .payments
            .update_delivery(&payment.id, outcome, sent_at)
            .await
        {
            error!(payment_id = %payment.id, error = %e, "Failed to record delivery flags");
            return payment;
        }
        payment.credentials_sent_at = Some(sent_at);
        payment.email_sent = outcome.email_sent;
        payment.sms_sent = outcome.sms_sent;
        payment.whatsapp_sent = outcome.whatsapp_sent;
        payment
    }
}
