//! Append-only activity log. Every account mutation is recorded here;
//! nothing reads it back for control flow.

use chrono::Local;

use crate::db::Db;
use crate::errors::AppError;
use crate::models::activity::{ActivityRecord, EventType};

/// Only the most recent entries are retained, oldest evicted first.
pub const ACTIVITY_CAP: usize = 100;

pub(crate) const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

pub(crate) fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Prepend a record (most-recent-first), truncate to the cap, persist.
/// An unreadable log is rewritten from empty; write failures surface.
pub fn record(
    db: &Db,
    event_type: EventType,
    username: &str,
    description: impl Into<String>,
) -> Result<(), AppError> {
    let entry = ActivityRecord {
        event_type,
        username: username.to_string(),
        timestamp: now_stamp(),
        description: description.into(),
    };
    db.activity.update_or_default(|records| {
        records.insert(0, entry);
        records.truncate(ACTIVITY_CAP);
    })
}

/// The `limit` most recent records. Read failures degrade to an empty list.
pub fn recent(db: &Db, limit: usize) -> Vec<ActivityRecord> {
    let mut records = db.activity.read_or_default();
    records.truncate(limit);
    records
}
