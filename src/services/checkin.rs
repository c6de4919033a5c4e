//! Check-in/out tracking over the check-in log store.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::db::Db;
use crate::errors::AppError;
use crate::models::activity::EventType;
use crate::models::checkin::{CheckinRecord, CheckinStatus};
use crate::services::activity::{self, TIMESTAMP_FORMAT};
use crate::services::auth::normalize_username;

/// Current check-in state for one user.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinStatusView {
    pub status: CheckinStatus,
    pub check_in_time: Option<String>,
    pub timestamp: Option<String>,
}

/// Record a check-in and audit it.
pub fn check_in(db: &Db, username: &str) -> Result<(), AppError> {
    let key = normalize_username(username);
    let stamp = activity::now_stamp();
    let record = CheckinRecord {
        username: key.clone(),
        status: CheckinStatus::CheckedIn,
        check_in_time: Some(stamp.clone()),
        duration: None,
        timestamp: stamp,
    };
    db.checkins.update_or_default(|records| records.insert(0, record))?;
    activity::record(db, EventType::CheckIn, &key, format!("{key} checked in"))
}

/// Record a check-out, computing the session duration from the most recent
/// open check-in.
pub fn check_out(db: &Db, username: &str) -> Result<(), AppError> {
    let key = normalize_username(username);
    let stamp = activity::now_stamp();
    // The duration lookup runs inside the update so a concurrent check-in
    // or check-out cannot slip in between the read and the write.
    db.checkins.update_or_default(|records| {
        let duration = records
            .iter()
            .find(|r| r.username == key)
            .filter(|r| r.status == CheckinStatus::CheckedIn)
            .and_then(|r| r.check_in_time.as_deref())
            .map(duration_since)
            .unwrap_or_else(|| "N/A".to_string());
        records.insert(
            0,
            CheckinRecord {
                username: key.clone(),
                status: CheckinStatus::CheckedOut,
                check_in_time: None,
                duration: Some(duration),
                timestamp: stamp,
            },
        );
    })?;
    activity::record(db, EventType::CheckOut, &key, format!("{key} checked out"))
}

/// Most recent check-in state for a user; no records reads as checked out.
pub fn current_status(db: &Db, username: &str) -> CheckinStatusView {
    let key = normalize_username(username);
    let records = db.checkins.read_or_default();
    match records.iter().find(|r| r.username == key) {
        Some(last) => CheckinStatusView {
            status: last.status,
            check_in_time: last.check_in_time.clone(),
            timestamp: Some(last.timestamp.clone()),
        },
        None => CheckinStatusView {
            status: CheckinStatus::CheckedOut,
            check_in_time: None,
            timestamp: None,
        },
    }
}

/// Check-in/out history, optionally filtered to one user, most recent
/// first.
pub fn history(db: &Db, username: Option<&str>, limit: usize) -> Vec<CheckinRecord> {
    let key = username.map(normalize_username);
    let mut records = db.checkins.read_or_default();
    if let Some(key) = key {
        records.retain(|r| r.username == key);
    }
    records.truncate(limit);
    records
}

fn duration_since(start: &str) -> String {
    match NaiveDateTime::parse_from_str(start, TIMESTAMP_FORMAT) {
        Ok(started) => {
            let elapsed = Local::now().naive_local() - started;
            let hours = elapsed.num_hours().max(0);
            let minutes = (elapsed.num_minutes() - hours * 60).max(0);
            format!(
                "{hours} hour{} and {minutes} minute{}",
                if hours == 1 { "" } else { "s" },
                if minutes == 1 { "" } else { "s" },
            )
        }
        Err(_) => "N/A".to_string(),
    }
}
