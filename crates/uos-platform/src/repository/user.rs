//! User Repository

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::domain::{Role, User};
use crate::error::Result;

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn find_by_institutional_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE institutional_email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    // Transaction-scoped operations

    pub async fn find_by_institutional_email_tx(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE institutional_email = $1")
            .bind(email)
            .fetch_optional(conn)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn institutional_email_exists_tx(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE institutional_email = $1")
            .bind(email)
            .fetch_one(conn)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n > 0)
    }

    /// All institutional emails, for the matricule counter seed scan.
    pub async fn list_institutional_emails_tx(conn: &mut SqliteConnection) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT institutional_email FROM users")
            .fetch_all(conn)
            .await?;
        rows.into_iter()
            .map(|r| {
                r.try_get::<String, _>("institutional_email")
                    .map_err(crate::error::PlatformError::from)
            })
            .collect()
    }

    pub async fn insert_tx(conn: &mut SqliteConnection, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, role, institutional_email, full_name, recovery_email, phone,
                password_hash, password_changed_at, is_active, campus_id_home,
                created_from_payment_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&user.id)
        .bind(user.role.as_str())
        .bind(&user.institutional_email)
        .bind(&user.full_name)
        .bind(&user.recovery_email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.password_changed_at)
        .bind(user.is_active)
        .bind(&user.campus_id_home)
        .bind(&user.created_from_payment_id)
        .bind(user.created_at)
        .execute(conn)
        .await
        .map_err(|e| {
            super::map_unique_violation(e, "User", "institutionalEmail", &user.institutional_email)
        })?;
        Ok(())
    }

    pub async fn set_active_tx(conn: &mut SqliteConnection, id: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

fn from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        role: Role::parse(&role)?,
        institutional_email: row.try_get("institutional_email")?,
        full_name: row.try_get("full_name")?,
        recovery_email: row.try_get("recovery_email")?,
        phone: row.try_get("phone")?,
        password_hash: row.try_get("password_hash")?,
        password_changed_at: row.try_get("password_changed_at")?,
        is_active: row.try_get("is_active")?,
        campus_id_home: row.try_get("campus_id_home")?,
        created_from_payment_id: row.try_get("created_from_payment_id")?,
        created_at: row.try_get("created_at")?,
    })
}
