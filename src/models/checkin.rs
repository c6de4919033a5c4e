//! Check-in/out tracking records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckinStatus {
    CheckedIn,
    CheckedOut,
}

/// One check-in or check-out event. Stored most-recent-first, same
/// convention as the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckinRecord {
    pub username: String,
    pub status: CheckinStatus,
    #[serde(default)]
    pub check_in_time: Option<String>,
    /// Human-readable duration, present on check-out records.
    #[serde(default)]
    pub duration: Option<String>,
    pub timestamp: String,
}
