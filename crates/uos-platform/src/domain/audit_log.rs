//! Audit Log Entity
//!
//! Append-only record of provisioning events. Entries are never updated or
//! deleted by this pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Audit action tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Account created from a cleared payment
    CreatedUserViaPayment,
    /// Inactive account reactivated by a payment clearance
    UserReactivated,
    /// Pending payment transitioned to cleared
    PaymentCleared,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreatedUserViaPayment => "CREATED_USER_VIA_PAYMENT",
            AuditAction::UserReactivated => "USER_REACTIVATED",
            AuditAction::PaymentCleared => "PAYMENT_CLEARED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "CREATED_USER_VIA_PAYMENT" => Ok(AuditAction::CreatedUserViaPayment),
            "USER_REACTIVATED" => Ok(AuditAction::UserReactivated),
            "PAYMENT_CLEARED" => Ok(AuditAction::PaymentCleared),
            other => Err(PlatformError::validation(format!("Unknown audit action: {other}"))),
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// TSID as Crockford Base32 string
    pub id: String,

    /// Account the action concerns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub action: AuditAction,

    pub description: String,

    /// Structured context (matricule, amount, campus, payment id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            user_id: None,
            action,
            description: description.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip() {
        for action in [
            AuditAction::CreatedUserViaPayment,
            AuditAction::UserReactivated,
            AuditAction::PaymentCleared,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()).unwrap(), action);
        }
        assert!(AuditAction::parse("DELETED_USER").is_err());
    }

    #[test]
    fn test_builder() {
        let log = AuditLog::new(AuditAction::CreatedUserViaPayment, "Created account")
            .with_user("user-1")
            .with_metadata(serde_json::json!({ "matricule": "2600001" }));

        assert_eq!(log.user_id.as_deref(), Some("user-1"));
        assert_eq!(log.action, AuditAction::CreatedUserViaPayment);
        assert!(log.metadata.is_some());
    }
}
