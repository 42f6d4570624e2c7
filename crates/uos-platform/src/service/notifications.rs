//! Notification Dispatch
//!
//! Fans generated credentials out over email, SMS, and WhatsApp. Each
//! channel's failure is isolated into a boolean outcome flag; dispatch never
//! propagates an error, so a delivery problem can never unwind a committed
//! account creation.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub use crate::domain::DeliveryOutcome;

/// Payload handed to a transport: `{to, subject?, message}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

/// One delivery transport (email, SMS, WhatsApp).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &ChannelMessage) -> anyhow::Result<()>;
}

/// Credentials to deliver after provisioning.
#[derive(Debug, Clone)]
pub struct CredentialNotification {
    pub full_name: String,
    pub institutional_email: String,
    pub personal_email: String,
    pub phone: Option<String>,
    pub temporary_password: String,
}

/// Credential fan-out over three independent channels.
pub struct NotificationService {
    email: Arc<dyn NotificationChannel>,
    sms: Arc<dyn NotificationChannel>,
    whatsapp: Arc<dyn NotificationChannel>,
}

impl NotificationService {
    pub fn new(
        email: Arc<dyn NotificationChannel>,
        sms: Arc<dyn NotificationChannel>,
        whatsapp: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self { email, sms, whatsapp }
    }

    /// All three channels delivered as structured log lines. This is the
    /// default transport; production deployments point individual channels
    /// at a gateway instead.
    pub fn log_only() -> Self {
        Self::new(
            Arc::new(LogChannel::new("email")),
            Arc::new(LogChannel::new("sms")),
            Arc::new(LogChannel::new("whatsapp")),
        )
    }

    /// Send credentials on every available channel and report per-channel
    /// outcomes. Channels without a destination (no phone number) are
    /// skipped and reported as not sent.
    pub async fn send_credentials(&self, credentials: &CredentialNotification) -> DeliveryOutcome {
        info!(recipient = %credentials.full_name, "Sending credentials");

        let email_sent = self
            .dispatch("email", &self.email, email_message(credentials))
            .await;

        let (sms_sent, whatsapp_sent) = match credentials.phone.as_deref() {
            Some(phone) if !phone.trim().is_empty() => {
                let sms_sent = self
                    .dispatch("sms", &self.sms, sms_message(credentials, phone))
                    .await;
                let whatsapp_sent = self
                    .dispatch("whatsapp", &self.whatsapp, whatsapp_message(credentials, phone))
                    .await;
                (sms_sent, whatsapp_sent)
            }
            _ => {
                warn!(
                    email = %credentials.institutional_email,
                    "No phone number, skipping SMS and WhatsApp"
                );
                (false, false)
            }
        };

        info!(email_sent, sms_sent, whatsapp_sent, "Credential dispatch finished");

        DeliveryOutcome {
            email_sent,
            sms_sent,
            whatsapp_sent,
        }
    }

    async fn dispatch(
        &self,
        channel_name: &str,
        channel: &Arc<dyn NotificationChannel>,
        message: ChannelMessage,
    ) -> bool {
        match channel.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                error!(channel = channel_name, error = %e, "Channel dispatch failed");
                false
            }
        }
    }
}

fn email_message(credentials: &CredentialNotification) -> ChannelMessage {
    ChannelMessage {
        to: credentials.personal_email.clone(),
        subject: Some("Welcome to UniOS - Your Login Credentials".to_string()),
        message: format!(
            "Dear {},\n\n\
             Your student account has been created.\n\n\
             Login email: {}\n\
             Temporary password: {}\n\n\
             IMPORTANT: Change your password at first login.\n\n\
             Login here: https://portal.university.edu/login",
            credentials.full_name, credentials.institutional_email, credentials.temporary_password,
        ),
    }
}

fn sms_message(credentials: &CredentialNotification, phone: &str) -> ChannelMessage {
    ChannelMessage {
        to: phone.to_string(),
        subject: None,
        message: format!(
            "UniOS: your login is ready. Email: {} | Password: {} | Change password at first login.",
            credentials.institutional_email, credentials.temporary_password,
        ),
    }
}

fn whatsapp_message(credentials: &CredentialNotification, phone: &str) -> ChannelMessage {
    ChannelMessage {
        to: phone.to_string(),
        subject: None,
        message: format!(
            "Welcome to UniOS!\n\
             Your account is ready:\n\
             Email: {}\n\
             Password: {}\n\
             Change your password at first login.\n\
             Login: https://portal.university.edu/login",
            credentials.institutional_email, credentials.temporary_password,
        ),
    }
}

/// Transport that writes deliveries to the structured log.
pub struct LogChannel {
    channel: &'static str,
}

impl LogChannel {
    pub fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, message: &ChannelMessage) -> anyhow::Result<()> {
        info!(
            channel = self.channel,
            to = %message.to,
            subject = ?message.subject,
            body = %message.message,
            "Notification delivered"
        );
        Ok(())
    }
}

/// Gateway configuration for HTTP-backed channels.
#[derive(Debug, Clone)]
pub struct NotificationGatewayConfig {
    /// Gateway base URL; the channel path is appended.
    pub base_url: String,
    /// Optional Bearer token
    pub api_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for NotificationGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            api_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Transport that POSTs the payload contract to an external gateway.
pub struct HttpGatewayChannel {
    config: NotificationGatewayConfig,
    path: String,
    client: reqwest::Client,
}

impl HttpGatewayChannel {
    pub fn new(config: NotificationGatewayConfig, path: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            path: path.into(),
            client,
        })
    }
}

#[async_trait]
impl NotificationChannel for HttpGatewayChannel {
    async fn send(&self, message: &ChannelMessage) -> anyhow::Result<()> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), self.path);

        let mut request = self.client.post(&url).json(message);
        if let Some(ref token) = self.config.api_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gateway returned {status}: {body}");
        }
        Ok(())
    }
}
