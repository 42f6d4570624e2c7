//! User Entity
//!
//! Student accounts created by the provisioning pipeline. The institutional
//! email doubles as the login identifier and embeds the matricule (directly,
//! or via the disambiguation suffix).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Platform role. This pipeline only ever creates `Student` accounts; the
/// remaining roles are managed by out-of-scope admin flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    CampusAdmin,
    Cashier,
    Lecturer,
    Student,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::CampusAdmin => "CAMPUS_ADMIN",
            Role::Cashier => "CASHIER",
            Role::Lecturer => "LECTURER",
            Role::Student => "STUDENT",
            Role::Guest => "GUEST",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "CAMPUS_ADMIN" => Ok(Role::CampusAdmin),
            "CASHIER" => Ok(Role::Cashier),
            "LECTURER" => Ok(Role::Lecturer),
            "STUDENT" => Ok(Role::Student),
            "GUEST" => Ok(Role::Guest),
            other => Err(PlatformError::validation(format!("Unknown role: {other}"))),
        }
    }
}

/// Student account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// TSID as Crockford Base32 string
    pub id: String,

    pub role: Role,

    /// Login identifier; globally unique
    pub institutional_email: String,

    pub full_name: String,

    /// Personal email for account recovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// bcrypt digest; never serialized
    #[serde(skip)]
    pub password_hash: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    /// Home campus assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus_id_home: Option<String>,

    /// One-to-one link to the payment that provisioned this account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_from_payment_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// New active student account provisioned from a payment.
    pub fn new_student(
        institutional_email: impl Into<String>,
        full_name: impl Into<String>,
        password_hash: impl Into<String>,
        payment_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            role: Role::Student,
            institutional_email: institutional_email.into(),
            full_name: full_name.into(),
            recovery_email: None,
            phone: None,
            password_hash: password_hash.into(),
            password_changed_at: Some(now),
            is_active: true,
            campus_id_home: None,
            created_from_payment_id: Some(payment_id.into()),
            created_at: now,
        }
    }

    pub fn with_contact(mut self, recovery_email: Option<String>, phone: Option<String>) -> Self {
        self.recovery_email = recovery_email;
        self.phone = phone;
        self
    }

    pub fn with_campus(mut self, campus_id: impl Into<String>) -> Self {
        self.campus_id_home = Some(campus_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::SuperAdmin,
            Role::CampusAdmin,
            Role::Cashier,
            Role::Lecturer,
            Role::Student,
            Role::Guest,
        ] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("PROVOST").is_err());
    }

    #[test]
    fn test_new_student_defaults() {
        let user = User::new_student("jane.doe@university.edu", "Jane Doe", "$2b$10$hash", "pay-1")
            .with_contact(Some("jane@mail.test".to_string()), None)
            .with_campus("campus-1");

        assert_eq!(user.role, Role::Student);
        assert!(user.is_active);
        assert_eq!(user.created_from_payment_id.as_deref(), Some("pay-1"));
        assert_eq!(user.campus_id_home.as_deref(), Some("campus-1"));
        assert!(user.password_changed_at.is_some());
    }
}
