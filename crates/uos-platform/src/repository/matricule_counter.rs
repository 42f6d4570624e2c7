//! Matricule Counter Repository
//!
//! One row per 2-digit year prefix holding the last assigned sequence
//! number. The increment is a single-row UPDATE inside the caller's
//! transaction, which serializes concurrent registrations touching the same
//! year prefix.

use sqlx::{Row, SqliteConnection};

use crate::error::Result;

pub struct MatriculeCounterRepository;

impl MatriculeCounterRepository {
    /// Atomically bump the counter and return the new sequence, or `None`
    /// when no counter row exists for the year prefix yet.
    pub async fn increment_tx(
        conn: &mut SqliteConnection,
        year_prefix: &str,
    ) -> Result<Option<u32>> {
        let row = sqlx::query(
            r#"
            UPDATE matricule_counters
            SET last_sequence = last_sequence + 1
            WHERE year_prefix = $1
            RETURNING last_sequence
            "#,
        )
        .bind(year_prefix)
        .fetch_optional(conn)
        .await?;

        match row {
            Some(r) => {
                let sequence: i64 = r.try_get("last_sequence")?;
                Ok(Some(sequence as u32))
            }
            None => Ok(None),
        }
    }

    /// Seed the counter row for a year prefix. Fails on a duplicate prefix,
    /// which callers inside a transaction never observe.
    pub async fn insert_tx(
        conn: &mut SqliteConnection,
        year_prefix: &str,
        last_sequence: u32,
    ) -> Result<()> {
        sqlx::query("INSERT INTO matricule_counters (year_prefix, last_sequence) VALUES ($1, $2)")
            .bind(year_prefix)
            .bind(last_sequence as i64)
            .execute(conn)
            .await?;
        Ok(())
    }
}
