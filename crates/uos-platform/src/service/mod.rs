//! Service Layer
//!
//! Business logic for the provisioning pipeline: identifier and credential
//! generation, the payment-to-account state machine, notification fan-out,
//! and audit recording.

pub mod audit;
pub mod identity;
pub mod notifications;
pub mod password;
pub mod provisioning;
pub mod seed;

pub use audit::AuditService;
pub use identity::{email_from_name, opaque_password, password_from_name, MatriculeGenerator};
pub use notifications::{
    ChannelMessage, CredentialNotification, DeliveryOutcome, HttpGatewayChannel, LogChannel,
    NotificationChannel, NotificationGatewayConfig, NotificationService,
};
pub use password::PasswordService;
pub use provisioning::{
    ClearanceOutcome, ProvisionedAccount, ProvisioningConfig, ProvisioningService,
    RegisterPaymentCommand,
};
pub use seed::DevDataSeeder;
