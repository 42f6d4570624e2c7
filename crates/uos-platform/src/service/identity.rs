//! Identifier Generation
//!
//! Matricules, institutional emails derived from student names, and
//! temporary passwords. Matricule assignment must run inside the caller's
//! transaction so the counter increment is serialized with the user insert.

use rand::Rng;
use regex::Regex;
use sqlx::SqliteConnection;
use std::sync::LazyLock;

use crate::domain::{matricule::MAX_SEQUENCE, Matricule};
use crate::error::{PlatformError, Result};
use crate::repository::{MatriculeCounterRepository, UserRepository};

/// Matricule-shaped email local-part: 2-digit year + 5-digit sequence.
static MATRICULE_LOCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\d{5}$").expect("valid matricule pattern"));

pub struct MatriculeGenerator;

impl MatriculeGenerator {
    /// Assign the next matricule for a year prefix.
    ///
    /// The per-year counter row is bumped atomically; when the year has no
    /// counter yet, it is seeded from the highest matricule-shaped email
    /// local-part already in the store, so the sequence stays recoverable
    /// after counter loss.
    pub async fn next(conn: &mut SqliteConnection, year_prefix: &str) -> Result<Matricule> {
        let sequence = match MatriculeCounterRepository::increment_tx(conn, year_prefix).await? {
            Some(sequence) => sequence,
            None => {
                let seeded = Self::max_assigned_sequence(conn, year_prefix).await? + 1;
                MatriculeCounterRepository::insert_tx(conn, year_prefix, seeded).await?;
                seeded
            }
        };

        if sequence > MAX_SEQUENCE {
            return Err(PlatformError::SequenceExhausted {
                year_prefix: year_prefix.to_string(),
            });
        }
        Matricule::new(year_prefix, sequence)
    }

    /// Highest sequence among existing institutional emails whose local-part
    /// is matricule-shaped and carries the given year prefix.
    async fn max_assigned_sequence(conn: &mut SqliteConnection, year_prefix: &str) -> Result<u32> {
        let emails = UserRepository::list_institutional_emails_tx(conn).await?;

        let max = emails
            .iter()
            .filter_map(|email| email.split('@').next())
            .filter(|local| MATRICULE_LOCAL_RE.is_match(local))
            .filter(|local| &local[..2] == year_prefix)
            .filter_map(|local| local[2..].parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(max)
    }
}

/// Derive an institutional email from a student name.
///
/// Lower-cases the name, takes the first and last whitespace tokens, strips
/// everything outside `a-z`, and joins them as `first.last`. Tokens that end
/// up empty are replaced with fixed placeholders so the local-part is never
/// empty. An optional disambiguation suffix goes between the local-part and
/// the domain.
pub fn email_from_name(full_name: &str, domain: &str, suffix: Option<&str>) -> String {
    let lowered = full_name.trim().to_lowercase();
    let mut tokens = lowered.split_whitespace();
    let first_token = tokens.next().unwrap_or_default();
    let last_token = tokens.last().unwrap_or(first_token);

    let first = clean_token(first_token, "student");
    let last = clean_token(last_token, "user");

    match suffix {
        Some(suffix) => format!("{first}.{last}{suffix}@{domain}"),
        None => format!("{first}.{last}@{domain}"),
    }
}

fn clean_token(token: &str, placeholder: &str) -> String {
    let cleaned: String = token.chars().filter(char::is_ascii_lowercase).collect();
    if cleaned.is_empty() {
        placeholder.to_string()
    } else {
        cleaned
    }
}

/// Temporary password for cashier registrations: the student's first name
/// plus a 2-digit random number. Deliberately dictation-friendly rather than
/// a security-grade secret; only the bcrypt digest is persisted.
pub fn password_from_name(full_name: &str) -> String {
    let first = full_name.trim().split_whitespace().next().unwrap_or("Student");
    let digits = rand::thread_rng().gen_range(10..=99);
    format!("{first}{digits}")
}

/// Opaque temporary password for webhook-provisioned accounts, where no
/// student name is available yet.
pub fn opaque_password() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}
