//! API Layer
//!
//! REST API endpoints for the provisioning pipeline.

pub mod audit_logs;
pub mod cashier;
pub mod common;
pub mod openapi;
pub mod payments;

pub use common::*;

pub use audit_logs::{audit_logs_router, AuditLogsState};
pub use cashier::{cashier_router, CashierState};
pub use openapi::PlatformApiDoc;
pub use payments::{payments_router, PaymentsState};
