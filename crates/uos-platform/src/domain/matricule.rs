//! Matricule Value Type
//!
//! The student's permanent enrollment identifier: `YYNNNNN`, a 2-digit year
//! prefix followed by a 5-digit zero-padded sequence. The matricule is
//! embedded in the institutional email local-part and is never stored as an
//! independent row.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Highest sequence number a single year prefix can hold.
pub const MAX_SEQUENCE: u32 = 99_999;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matricule(String);

impl Matricule {
    /// Build a matricule from a year prefix and sequence number.
    pub fn new(year_prefix: &str, sequence: u32) -> Result<Self> {
        if year_prefix.len() != 2 || !year_prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PlatformError::InvalidMatricule(format!(
                "year prefix must be 2 digits, got {year_prefix:?}"
            )));
        }
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(PlatformError::InvalidMatricule(format!(
                "sequence {sequence} out of range 1..={MAX_SEQUENCE}"
            )));
        }
        Ok(Self(format!("{year_prefix}{sequence:05}")))
    }

    /// Parse a 7-digit matricule string.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != 7 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PlatformError::InvalidMatricule(format!(
                "expected 7 digits, got {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Last two digits of the current year, e.g. "26" in 2026.
    pub fn current_year_prefix() -> String {
        format!("{:02}", Utc::now().year() % 100)
    }

    pub fn year_prefix(&self) -> &str {
        &self.0[..2]
    }

    pub fn sequence(&self) -> u32 {
        // Validated on construction, so this cannot fail.
        self.0[2..].parse().unwrap_or(0)
    }

    /// Last three characters, appended to a derived email local-part when it
    /// collides with an existing account.
    pub fn disambiguation_suffix(&self) -> &str {
        &self.0[4..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Matricule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
