//! Campus Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical campus students are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    /// TSID as Crockford Base32 string
    pub id: String,

    /// URL-safe identifier used by callers, e.g. "town-a"
    pub slug: String,

    pub name: String,

    pub created_at: DateTime<Utc>,
}

impl Campus {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            slug: slug.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
