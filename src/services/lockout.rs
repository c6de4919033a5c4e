//! Brute-force lockout tracker backing the credential check.
//!
//! Pure data component over the lockout store. Policy (threshold, window,
//! expiry) lives in [`crate::services::auth`]; this module only maintains
//! the per-username counters, each mutation as one atomic store update.

use chrono::Utc;

use crate::db::Db;
use crate::errors::AppError;
use crate::models::lockout::LockoutState;
use crate::services::auth::{normalize_username, MAX_FAILED_ATTEMPTS};

/// Current tracker state for a username; absent entries read as clean.
pub fn get(db: &Db, username: &str) -> Result<LockoutState, AppError> {
    let key = normalize_username(username);
    Ok(db.lockouts.read()?.get(&key).cloned().unwrap_or_default())
}

/// Record one failed attempt, creating the entry if absent. Returns the
/// post-increment failure count.
pub fn record_failure(db: &Db, username: &str) -> Result<u32, AppError> {
    let key = normalize_username(username);
    db.lockouts.update(|states| {
        let state = states.entry(key).or_default();
        state.failed_count += 1;
        let now = Utc::now();
        state.last_attempt_time = Some(now);
        if state.failed_count == MAX_FAILED_ATTEMPTS {
            state.locked_at = Some(now);
        }
        state.failed_count
    })
}

/// Clear the counters for a username. No-op if no entry exists.
pub fn reset(db: &Db, username: &str) -> Result<(), AppError> {
    let key = normalize_username(username);
    db.lockouts.update(|states| {
        if let Some(state) = states.get_mut(&key) {
            *state = LockoutState::default();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_failure_creates_entry_and_counts() {
        let db = Db::in_memory();
        assert_eq!(record_failure(&db, "alice").unwrap(), 1);
        assert_eq!(record_failure(&db, "alice").unwrap(), 2);
        let state = get(&db, "alice").unwrap();
        assert_eq!(state.failed_count, 2);
        assert!(state.last_attempt_time.is_some());
        assert!(state.locked_at.is_none());
    }

    #[test]
    fn locked_at_set_when_threshold_reached() {
        let db = Db::in_memory();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            record_failure(&db, "alice").unwrap();
        }
        let state = get(&db, "alice").unwrap();
        assert_eq!(state.failed_count, MAX_FAILED_ATTEMPTS);
        assert!(state.locked_at.is_some());
    }

    #[test]
    fn reset_clears_counters() {
        let db = Db::in_memory();
        record_failure(&db, "alice").unwrap();
        reset(&db, "alice").unwrap();
        assert_eq!(get(&db, "alice").unwrap(), LockoutState::default());
    }

    #[test]
    fn reset_is_noop_for_unknown_username() {
        let db = Db::in_memory();
        reset(&db, "ghost").unwrap();
        assert!(db.lockouts.read().unwrap().is_empty());
    }

    #[test]
    fn keys_are_normalized() {
        let db = Db::in_memory();
        record_failure(&db, "  ALICE ").unwrap();
        assert_eq!(get(&db, "alice").unwrap().failed_count, 1);
    }
}
