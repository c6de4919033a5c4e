//! Per-username brute-force lockout tracker state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed-login counter, keyed by normalized username in its own store.
/// Lifecycled independently of the account: an entry may exist for a
/// username that was never registered (probes are rate-limited too), and a
/// stale entry left behind by a deleted account is harmless.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LockoutState {
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub last_attempt_time: Option<DateTime<Utc>>,
    /// Set when failed_count first reaches the threshold. Informational.
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_clean() {
        let state = LockoutState::default();
        assert_eq!(state.failed_count, 0);
        assert!(state.last_attempt_time.is_none());
        assert!(state.locked_at.is_none());
    }

    #[test]
    fn timestamps_round_trip_as_iso8601() {
        let state = LockoutState {
            failed_count: 2,
            last_attempt_time: Some(Utc::now()),
            locked_at: None,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: LockoutState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
