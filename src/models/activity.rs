//! Append-only activity/audit log records.

use serde::{Deserialize, Serialize};

/// Fixed vocabulary of auditable account events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LoginSuccess,
    LoginFailed,
    UserCreated,
    UserDeleted,
    UserLocked,
    UserUnlocked,
    ProfileUpdated,
    Logout,
    CheckIn,
    CheckOut,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LoginSuccess => "login_success",
            EventType::LoginFailed => "login_failed",
            EventType::UserCreated => "user_created",
            EventType::UserDeleted => "user_deleted",
            EventType::UserLocked => "user_locked",
            EventType::UserUnlocked => "user_unlocked",
            EventType::ProfileUpdated => "profile_updated",
            EventType::Logout => "logout",
            EventType::CheckIn => "check_in",
            EventType::CheckOut => "check_out",
        }
    }
}

/// Immutable audit entry. The log is ordered most-recent-first and capped;
/// nothing reads it for control flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub event_type: EventType,
    /// Actor or subject of the event.
    pub username: String,
    /// Human-readable local timestamp, e.g. "06/01/2026, 09:15:02 AM".
    pub timestamp: String,
    pub description: String,
}
