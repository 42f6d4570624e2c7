//! Campus Repository

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::domain::Campus;
use crate::error::Result;

pub struct CampusRepository {
    pool: SqlitePool,
}

impl CampusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Campus>> {
        let row = sqlx::query("SELECT * FROM campuses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Campus>> {
        let rows = sqlx::query("SELECT * FROM campuses ORDER BY slug")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(from_row).collect()
    }

    pub async fn insert(&self, campus: &Campus) -> Result<()> {
        sqlx::query("INSERT INTO campuses (id, slug, name, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&campus.id)
            .bind(&campus.slug)
            .bind(&campus.name)
            .bind(campus.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| super::map_unique_violation(e, "Campus", "slug", &campus.slug))?;
        Ok(())
    }

    pub async fn find_by_slug_tx(
        conn: &mut SqliteConnection,
        slug: &str,
    ) -> Result<Option<Campus>> {
        let row = sqlx::query("SELECT * FROM campuses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(conn)
            .await?;
        row.map(|r| from_row(&r)).transpose()
    }
}

fn from_row(row: &SqliteRow) -> Result<Campus> {
    Ok(Campus {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}
