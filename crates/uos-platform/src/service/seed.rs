//! Development Data Seeding

use std::sync::Arc;
use tracing::info;

use crate::domain::Campus;
use crate::error::Result;
use crate::repository::CampusRepository;

const CAMPUSES: [(&str, &str); 4] = [
    ("town-a", "Town A Campus"),
    ("town-b", "Town B Campus"),
    ("town-c", "Town C Campus"),
    ("town-d", "Town D Campus"),
];

/// Seeds the campuses registrations resolve against. Idempotent: existing
/// slugs are left untouched.
pub struct DevDataSeeder {
    campuses: Arc<CampusRepository>,
}

impl DevDataSeeder {
    pub fn new(campuses: Arc<CampusRepository>) -> Self {
        Self { campuses }
    }

    pub async fn seed(&self) -> Result<()> {
        for (slug, name) in CAMPUSES {
            if self.campuses.find_by_slug(slug).await?.is_none() {
                self.campuses.insert(&Campus::new(slug, name)).await?;
                info!(slug, "Seeded campus");
            }
        }
        Ok(())
    }
}
