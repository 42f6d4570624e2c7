//! Audit Service
//!
//! Appends provisioning events to the audit trail. Recording is best-effort:
//! a failed insert is logged and swallowed so it can never unwind an
//! already-committed provisioning.

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::AuditLog;
use crate::repository::AuditLogRepository;

#[derive(Clone)]
pub struct AuditService {
    repo: Arc<AuditLogRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<AuditLogRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, log: AuditLog) {
        info!(
            action = log.action.as_str(),
            user_id = ?log.user_id,
            description = %log.description,
            "Audit log recorded"
        );

        if let Err(e) = self.repo.insert(&log).await {
            error!(error = %e, "Failed to insert audit log");
        }
    }
}
