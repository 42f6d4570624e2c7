//! Schema Bootstrap

use sqlx::SqlitePool;

use crate::error::Result;

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campuses (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            external_ref TEXT NOT NULL UNIQUE,
            student_matricule TEXT,
            student_name TEXT,
            personal_email TEXT,
            phone_number TEXT,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL,
            cleared_at TEXT,
            credentials_sent_at TEXT,
            email_sent INTEGER NOT NULL DEFAULT 0,
            sms_sent INTEGER NOT NULL DEFAULT 0,
            whatsapp_sent INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_status ON payments(status)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            role TEXT NOT NULL,
            institutional_email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            recovery_email TEXT,
            phone TEXT,
            password_hash TEXT NOT NULL,
            password_changed_at TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            campus_id_home TEXT,
            created_from_payment_id TEXT UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matricule_counters (
            year_prefix TEXT PRIMARY KEY,
            last_sequence INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            action TEXT NOT NULL,
            description TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
