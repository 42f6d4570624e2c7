//! Payment Repository

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::domain::{DeliveryOutcome, Payment, PaymentStatus};
use crate::error::Result;

pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn find_by_external_ref(&self, external_ref: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE external_ref = $1")
            .bind(external_ref)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    /// Insert a payment on the pool, outside any provisioning transaction.
    /// Used by intake flows that record pending payments ahead of clearance.
    pub async fn insert(&self, payment: &Payment) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_tx(&mut conn, payment).await
    }

    /// Record which channels credentials went out on.
    pub async fn update_delivery(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payments
            SET credentials_sent_at = $1, email_sent = $2, sms_sent = $3, whatsapp_sent = $4
            WHERE id = $5
            "#,
        )
        .bind(sent_at)
        .bind(outcome.email_sent)
        .bind(outcome.sms_sent)
        .bind(outcome.whatsapp_sent)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Number of payments cleared since the given instant.
    pub async fn count_cleared_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM payments WHERE status = 'CLEARED' AND cleared_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn count_pending(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM payments WHERE status = 'PENDING'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn total_cleared_amount(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM payments WHERE status = 'CLEARED'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("total")?)
    }

    // Transaction-scoped operations

    pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn find_by_external_ref_tx(
        conn: &mut SqliteConnection,
        external_ref: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE external_ref = $1")
            .bind(external_ref)
            .fetch_optional(conn)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn insert_tx(conn: &mut SqliteConnection, payment: &Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, external_ref, student_matricule, student_name, personal_email,
                phone_number, amount, status, cleared_at, credentials_sent_at,
                email_sent, sms_sent, whatsapp_sent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.external_ref)
        .bind(&payment.student_matricule)
        .bind(&payment.student_name)
        .bind(&payment.personal_email)
        .bind(&payment.phone_number)
        .bind(payment.amount)
        .bind(payment.status.as_str())
        .bind(payment.cleared_at)
        .bind(payment.credentials_sent_at)
        .bind(payment.email_sent)
        .bind(payment.sms_sent)
        .bind(payment.whatsapp_sent)
        .bind(payment.created_at)
        .execute(conn)
        .await
        .map_err(|e| {
            super::map_unique_violation(e, "Payment", "externalRef", &payment.external_ref)
        })?;
        Ok(())
    }

    pub async fn update_status_tx(
        conn: &mut SqliteConnection,
        id: &str,
        status: PaymentStatus,
        cleared_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("UPDATE payments SET status = $1, cleared_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(cleared_at)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

fn from_row(row: &SqliteRow) -> Result<Payment> {
    let status: String = row.try_get("status")?;
    Ok(Payment {
        id: row.try_get("id")?,
        external_ref: row.try_get("external_ref")?,
        student_matricule: row.try_get("student_matricule")?,
        student_name: row.try_get("student_name")?,
        personal_email: row.try_get("personal_email")?,
        phone_number: row.try_get("phone_number")?,
        amount: row.try_get("amount")?,
        status: PaymentStatus::parse(&status)?,
        cleared_at: row.try_get("cleared_at")?,
        credentials_sent_at: row.try_get("credentials_sent_at")?,
        email_sent: row.try_get("email_sent")?,
        sms_sent: row.try_get("sms_sent")?,
        whatsapp_sent: row.try_get("whatsapp_sent")?,
        created_at: row.try_get("created_at")?,
    })
}
