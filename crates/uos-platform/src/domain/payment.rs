//! Payment Entity
//!
//! One cleared-or-pending tuition payment. The external reference is the
//! caller-supplied idempotency key and is unique across all payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PlatformError, Result};

/// Payment lifecycle status.
///
/// Legal transitions: `Pending -> Cleared` and `Pending -> Failed`.
/// Both `Cleared` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Cleared,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Cleared => "CLEARED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "CLEARED" => Ok(PaymentStatus::Cleared),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(PlatformError::validation(format!("Unknown payment status: {other}"))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Cleared | PaymentStatus::Failed)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Cleared)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel delivery flags, persisted on the payment row after the
/// credential dispatch that follows provisioning.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub email_sent: bool,
    pub sms_sent: bool,
    pub whatsapp_sent: bool,
}

/// Tuition payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// TSID as Crockford Base32 string
    pub id: String,

    /// Gateway/cashier reference, globally unique
    pub external_ref: String,

    /// Matricule assigned during provisioning (or by the gateway intake)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_matricule: Option<String>,

    /// Student display name as entered at the counter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,

    /// Personal contact email for credential delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_email: Option<String>,

    /// Contact phone for SMS/WhatsApp delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Amount in whole currency units
    pub amount: i64,

    pub status: PaymentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<DateTime<Utc>>,

    /// When credential notifications were dispatched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_sent_at: Option<DateTime<Utc>>,

    /// Per-channel delivery flags
    pub email_sent: bool,
    pub sms_sent: bool,
    pub whatsapp_sent: bool,

    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// New payment in `Pending` state, awaiting clearance.
    pub fn new_pending(external_ref: impl Into<String>, amount: i64) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            external_ref: external_ref.into(),
            student_matricule: None,
            student_name: None,
            personal_email: None,
            phone_number: None,
            amount,
            status: PaymentStatus::Pending,
            cleared_at: None,
            credentials_sent_at: None,
            email_sent: false,
            sms_sent: false,
            whatsapp_sent: false,
            created_at: Utc::now(),
        }
    }

    /// New payment recorded at the cashier counter, cleared on intake.
    pub fn new_cleared(
        external_ref: impl Into<String>,
        matricule: impl Into<String>,
        student_name: impl Into<String>,
        personal_email: impl Into<String>,
        phone_number: impl Into<String>,
        amount: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            external_ref: external_ref.into(),
            student_matricule: Some(matricule.into()),
            student_name: Some(student_name.into()),
            personal_email: Some(personal_email.into()),
            phone_number: Some(phone_number.into()),
            amount,
            status: PaymentStatus::Cleared,
            cleared_at: Some(now),
            credentials_sent_at: None,
            email_sent: false,
            sms_sent: false,
            whatsapp_sent: false,
            created_at: now,
        }
    }

    pub fn with_matricule(mut self, matricule: impl Into<String>) -> Self {
        self.student_matricule = Some(matricule.into());
        self
    }

    pub fn with_contact(
        mut self,
        personal_email: Option<String>,
        phone_number: Option<String>,
    ) -> Self {
        self.personal_email = personal_email;
        self.phone_number = phone_number;
        self
    }

    /// Apply a status transition, rejecting illegal ones.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PlatformError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next == PaymentStatus::Cleared {
            self.cleared_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [PaymentStatus::Pending, PaymentStatus::Cleared, PaymentStatus::Failed] {
            assert_eq!(PaymentStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PaymentStatus::parse("SETTLED").is_err());
    }

    #[test]
    fn test_legal_transitions() {
        let mut payment = Payment::new_pending("PAY-1", 50_000);
        payment.transition(PaymentStatus::Cleared).unwrap();
        assert_eq!(payment.status, PaymentStatus::Cleared);
        assert!(payment.cleared_at.is_some());

        let mut failed = Payment::new_pending("PAY-2", 50_000);
        failed.transition(PaymentStatus::Failed).unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut payment = Payment::new_pending("PAY-3", 50_000);
        payment.transition(PaymentStatus::Cleared).unwrap();

        // Terminal states never move again.
        assert!(payment.transition(PaymentStatus::Pending).is_err());
        assert!(payment.transition(PaymentStatus::Failed).is_err());
        assert!(payment.transition(PaymentStatus::Cleared).is_err());
    }

    #[test]
    fn test_cashier_intake_is_cleared() {
        let payment = Payment::new_cleared("PAY-4", "2600001", "Jane Doe", "jane@mail.test", "+237650000001", 50_000);
        assert_eq!(payment.status, PaymentStatus::Cleared);
        assert!(payment.cleared_at.is_some());
        assert!(!payment.email_sent);
    }
}
