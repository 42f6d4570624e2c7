//! UniOS Platform Server
//!
//! Production server for the provisioning REST APIs:
//! - Cashier APIs: register-payment, stats
//! - Gateway APIs: payment webhook
//! - Admin APIs: audit logs
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `UOS_API_PORT` | `8080` | HTTP API port |
//! | `UOS_METRICS_PORT` | `9090` | Metrics/health port |
//! | `UOS_DATABASE_URL` | `sqlite:uos.db?mode=rwc` | SQLite connection URL |
//! | `UOS_EMAIL_DOMAIN` | `university.edu` | Institutional email domain |
//! | `UOS_DEFAULT_CAMPUS` | `town-a` | Campus slug used when unspecified |
//! | `UOS_NOTIFY_GATEWAY_URL` | - | Notification gateway base URL (log transport when unset) |
//! | `UOS_NOTIFY_GATEWAY_TOKEN` | - | Bearer token for the gateway |
//! | `UOS_DEV_MODE` | `false` | Seed campuses at startup |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use uos_platform::api::{
    audit_logs_router, cashier_router, payments_router, AuditLogsState, CashierState,
    PaymentsState, PlatformApiDoc,
};
use uos_platform::repository::{
    init_schema, AuditLogRepository, CampusRepository, PaymentRepository,
};
use uos_platform::service::{
    AuditService, DevDataSeeder, HttpGatewayChannel, NotificationGatewayConfig,
    NotificationService, PasswordService, ProvisioningConfig, ProvisioningService,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting UniOS Platform Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("UOS_API_PORT", 8080);
    let metrics_port: u16 = env_or_parse("UOS_METRICS_PORT", 9090);
    let database_url = env_or("UOS_DATABASE_URL", "sqlite:uos.db?mode=rwc");
    let email_domain = env_or("UOS_EMAIL_DOMAIN", "university.edu");
    let default_campus = env_or("UOS_DEFAULT_CAMPUS", "town-a");

    // Connect to the store. A single pooled connection serializes
    // provisioning transactions on SQLite's one writer.
    info!("Connecting to database: {}", database_url);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    init_schema(&pool).await?;

    // Initialize repositories
    let payment_repo = Arc::new(PaymentRepository::new(pool.clone()));
    let campus_repo = Arc::new(CampusRepository::new(pool.clone()));
    let audit_log_repo = Arc::new(AuditLogRepository::new(pool.clone()));
    info!("Repositories initialized");

    // Seed development data if in dev mode
    let dev_mode = std::env::var("UOS_DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if dev_mode {
        let seeder = DevDataSeeder::new(campus_repo.clone());
        if let Err(e) = seeder.seed().await {
            tracing::warn!("Dev data seeding skipped (data may already exist): {}", e);
        }
    }

    // Notification transport: HTTP gateway when configured, logs otherwise
    let notifications = Arc::new(match std::env::var("UOS_NOTIFY_GATEWAY_URL") {
        Ok(base_url) => {
            info!("Using notification gateway at {}", base_url);
            let config = NotificationGatewayConfig {
                base_url,
                api_token: std::env::var("UOS_NOTIFY_GATEWAY_TOKEN").ok(),
                ..NotificationGatewayConfig::default()
            };
            NotificationService::new(
                Arc::new(HttpGatewayChannel::new(config.clone(), "email")?),
                Arc::new(HttpGatewayChannel::new(config.clone(), "sms")?),
                Arc::new(HttpGatewayChannel::new(config, "whatsapp")?),
            )
        }
        Err(_) => NotificationService::log_only(),
    });

    // Assemble services
    let password_service = Arc::new(PasswordService::default());
    let audit_service = AuditService::new(audit_log_repo.clone());
    let provisioning = Arc::new(ProvisioningService::new(
        pool.clone(),
        payment_repo.clone(),
        password_service,
        notifications,
        audit_service,
        ProvisioningConfig {
            email_domain,
            default_campus_slug: default_campus,
        },
    ));
    info!("Services initialized");

    // Build API states
    let cashier_state = CashierState {
        provisioning: provisioning.clone(),
        payment_repo,
    };
    let payments_state = PaymentsState { provisioning };
    let audit_logs_state = AuditLogsState { audit_log_repo };

    // Build the API router
    let app = Router::new()
        .nest("/cashier", cashier_router(cashier_state))
        .nest("/payment", payments_router(payments_state))
        .nest("/api/admin/platform/audit-logs", audit_logs_router(audit_logs_state))
        .route("/q/openapi", get(openapi_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    // Start metrics server
    let metrics_addr = format!("0.0.0.0:{}", metrics_port);
    info!("Metrics server listening on http://{}/metrics", metrics_addr);

    let metrics_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    let metrics_listener = TcpListener::bind(&metrics_addr).await?;
    let metrics_task = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_app).await.unwrap();
    });

    info!("UniOS Platform Server started");
    info!("Press Ctrl+C to shutdown");

    // Wait for shutdown
    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();
    metrics_task.abort();

    info!("UniOS Platform Server shutdown complete");
    Ok(())
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(serde_json::to_value(PlatformApiDoc::openapi()).unwrap_or_default())
}

async fn metrics_handler() -> &'static str {
    "# HELP uos_platform_up Platform is up\n# TYPE uos_platform_up gauge\nuos_platform_up 1\n"
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
