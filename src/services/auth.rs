//! Authentication service: password hashing, credential verification, and
//! the account-lockout state machine.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::Db;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::services::lockout;

/// Failed attempts before automatic lockout.
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// Lockout window in minutes after reaching the threshold.
pub const LOCKOUT_MINUTES: i64 = 15;

/// Outcome of a credential check. Failures are data, not errors: the only
/// `Err` a check produces is a storage failure.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialCheck {
    pub success: bool,
    pub message: String,
    pub remaining_lockout_minutes: i64,
    /// The account's role, present only on success. Captured inside the
    /// credential-check gate so callers never re-read the store for it.
    pub role: Option<Role>,
}

impl CredentialCheck {
    fn failure(message: String, remaining_lockout_minutes: i64) -> Self {
        Self {
            success: false,
            message,
            remaining_lockout_minutes,
            role: None,
        }
    }
}

/// Canonical storage/lookup key: trimmed and lowercased. Applied at every
/// read/write boundary.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash. An account with a
/// missing or malformed hash can never authenticate.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not parseable, rejecting");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Decide whether a (username, password) pair authenticates right now,
/// maintaining the lockout counters as a side effect.
///
/// Gate order: unknown username, administrator lock, automatic lockout,
/// password. The whole check runs under one gate so concurrent attempts
/// against the same store never lose a counter increment.
pub fn check_credentials(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<CredentialCheck, AppError> {
    let key = normalize_username(username);
    let _gate = db
        .auth_gate
        .lock()
        .map_err(|_| AppError::Storage("credential check gate poisoned".to_string()))?;

    let accounts = db.accounts.read()?;
    let Some(account) = accounts.get(&key) else {
        // Unknown usernames are rate-limited too, keyed by the attempted
        // name, so probing does not reveal which accounts exist.
        let count = lockout::record_failure(db, &key)?;
        return Ok(CredentialCheck::failure(
            format!("Invalid username or password. Attempt {count}/{MAX_FAILED_ATTEMPTS}"),
            0,
        ));
    };

    // Administrator lock is orthogonal to brute-force counting: no
    // increment, distinct message.
    if account.locked {
        return Ok(CredentialCheck::failure(
            "Account locked by admin. Contact administrator.".to_string(),
            0,
        ));
    }

    let state = lockout::get(db, &key)?;
    if state.failed_count >= MAX_FAILED_ATTEMPTS {
        if let Some(last_attempt) = state.last_attempt_time {
            let expiry = last_attempt + Duration::minutes(LOCKOUT_MINUTES);
            let now = Utc::now();
            if now < expiry {
                let remaining = remaining_minutes(expiry, now);
                return Ok(CredentialCheck::failure(
                    format!("Account locked. Try again in {remaining} minutes."),
                    remaining,
                ));
            }
        }
        // Window expired: clean slate before the password check.
        lockout::reset(db, &key)?;
    }

    let password_hash = account.password_hash.clone();
    let role = account.role;
    drop(accounts);

    if !verify_password(password, &password_hash) {
        let count = lockout::record_failure(db, &key)?;
        return Ok(CredentialCheck::failure(
            format!("Invalid username or password. Attempt {count}/{MAX_FAILED_ATTEMPTS}"),
            0,
        ));
    }

    lockout::reset(db, &key)?;
    db.accounts.update(|accounts| {
        if let Some(account) = accounts.get_mut(&key) {
            account.last_login = Some(Utc::now());
        }
    })?;

    Ok(CredentialCheck {
        success: true,
        message: "Login successful".to_string(),
        remaining_lockout_minutes: 0,
        role: Some(role),
    })
}

/// Re-proof of identity for credential- or identity-affecting profile
/// changes. No lockout side effects.
pub fn verify_current_password(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    let key = normalize_username(username);
    let accounts = db.accounts.read()?;
    Ok(accounts
        .get(&key)
        .is_some_and(|account| verify_password(password, &account.password_hash)))
}

fn remaining_minutes(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry - now).num_seconds() / 60 + 1
}
