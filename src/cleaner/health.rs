//! Health Module
//!
//! Liveness and readiness derived from the outcome of the latest scan.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Description of a task that has not finished a scan yet.
pub const NOT_STARTED: &str = "Not yet started";
/// Description after a successful scan.
pub const FOLDER_CLEANED: &str = "Folder cleaned";
/// Description after a failed scan.
pub const CLEAN_FAILED: &str = "Error cleaning folder";

// == Health Record ==
/// Outcome of the most recent scan.
///
/// `is_healthy` and `description` are always replaced together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    pub is_healthy: bool,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl HealthRecord {
    pub fn new(is_healthy: bool, description: impl Into<String>) -> Self {
        Self {
            is_healthy,
            description: description.into(),
            updated_at: Utc::now(),
        }
    }

    /// The state of every task before its first scan.
    pub fn not_started() -> Self {
        Self::new(false, NOT_STARTED)
    }

    pub fn as_pair(&self) -> (bool, String) {
        (self.is_healthy, self.description.clone())
    }
}

// == Health Reporter ==
/// Liveness/readiness probe surface.
///
/// Readiness has no separate startup concept and defaults to liveness.
pub trait HealthReporter {
    fn is_alive(&self) -> (bool, String);

    fn is_ready(&self) -> (bool, String) {
        self.is_alive()
    }
}

/// ANDs the reports of `reporters`, returning the first failure.
pub(crate) fn first_unhealthy<'a, R, I>(reporters: I, probe: fn(&R) -> (bool, String)) -> Option<String>
where
    R: 'a,
    I: IntoIterator<Item = &'a R>,
{
    reporters.into_iter().find_map(|reporter| {
        let (healthy, description) = probe(reporter);
        (!healthy).then_some(description)
    })
}
