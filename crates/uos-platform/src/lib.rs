//! UniOS Platform
//!
//! Core platform providing:
//! - Payment intake and clearance state machine
//! - Matricule and institutional-email generation
//! - Student account provisioning with temporary credentials
//! - Multi-channel credential notification dispatch
//! - Append-only audit trail

pub mod domain;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;
pub mod tsid;

pub use domain::*;
pub use error::PlatformError;
pub use tsid::TsidGenerator;
