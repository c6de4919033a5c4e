//! Account store administration: create, profile upsert/update, delete,
//! lock toggling, search, and the default-admin bootstrap. Every mutation
//! is audited through the activity log.

use crate::db::Db;
use crate::errors::AppError;
use crate::models::activity::EventType;
use crate::models::user::{Account, AccountStatus, AccountView, Role};
use crate::services::auth::{self, normalize_username};
use crate::services::{activity, lockout};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Minimum length for new passwords.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Profile update request. Identity- or credential-affecting changes
/// (rename, password change) require `current_password` as re-proof.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Current (session) username of the account being updated.
    pub username: String,
    /// Requested new username; a rename is a destructive move to a new key.
    pub new_username: Option<String>,
    pub name: String,
    pub email: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Create a minimal credential record. Returns false (no error) if the
/// normalized username already exists.
pub fn create(
    db: &Db,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<bool, AppError> {
    let key = normalize_username(username);
    if key.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    let password_hash = auth::hash_password(password)?;
    db.accounts.update(|accounts| {
        if accounts.contains_key(&key) {
            return false;
        }
        let mut account = Account {
            password_hash,
            ..Default::default()
        };
        if let Some(email) = email {
            account.email = email.trim().to_string();
        }
        accounts.insert(key, account);
        true
    })
}

/// Full profile replace (not a patch): creates the record if missing,
/// otherwise overwrites metadata and forces `locked=false`,
/// `status=Active`. Used by the signup flow after [`create`].
pub fn upsert_profile(
    db: &Db,
    username: &str,
    name: &str,
    email: &str,
    role: Role,
) -> Result<bool, AppError> {
    let key = normalize_username(username);
    if key.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    let name = name.trim().to_string();
    let email = email.trim().to_string();
    let created = db.accounts.update(|accounts| match accounts.get_mut(&key) {
        Some(account) => {
            account.name = name;
            account.email = email.clone();
            account.role = role;
            account.status = AccountStatus::Active;
            account.twofa = false;
            account.last_login = None;
            account.locked = false;
            false
        }
        None => {
            accounts.insert(
                key.clone(),
                Account {
                    name,
                    email: email.clone(),
                    role,
                    ..Default::default()
                },
            );
            true
        }
    })?;
    if created {
        activity::record(
            db,
            EventType::UserCreated,
            DEFAULT_ADMIN_USERNAME,
            format!("New user {key} created with email {email}"),
        )?;
    }
    Ok(true)
}

/// Remove an account. Returns false if absent. The lockout tracker entry,
/// if any, is left behind (stale trackers are harmless).
pub fn delete(db: &Db, username: &str, actor: &str) -> Result<bool, AppError> {
    let key = normalize_username(username);
    let removed = db.accounts.update(|accounts| accounts.remove(&key).is_some())?;
    if removed {
        activity::record(
            db,
            EventType::UserDeleted,
            actor,
            format!("User {key} deleted by {actor}"),
        )?;
    }
    Ok(removed)
}

/// Flip the administrator lock. Unlocking also resets the brute-force
/// counters so an admin unlock always grants a clean slate. Returns false
/// if the account does not exist.
pub fn toggle_lock(db: &Db, username: &str, actor: &str) -> Result<bool, AppError> {
    let key = normalize_username(username);
    let now_locked = db.accounts.update(|accounts| {
        accounts.get_mut(&key).map(|account| {
            account.locked = !account.locked;
            account.locked
        })
    })?;
    let Some(now_locked) = now_locked else {
        return Ok(false);
    };
    if !now_locked {
        lockout::reset(db, &key)?;
    }
    let (event, verb) = if now_locked {
        (EventType::UserLocked, "locked")
    } else {
        (EventType::UserUnlocked, "unlocked")
    };
    activity::record(db, event, actor, format!("User {key} {verb} by {actor}"))?;
    Ok(true)
}

/// Update profile fields, optionally renaming the account or changing its
/// password. Returns the updated view; after a rename the caller must
/// rebind any session reference to the returned username.
pub fn update_profile(db: &Db, update: ProfileUpdate) -> Result<AccountView, AppError> {
    let key = normalize_username(&update.username);
    let target = update
        .new_username
        .as_deref()
        .map(normalize_username)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| key.clone());
    let renaming = target != key;
    let changing_password = update
        .new_password
        .as_deref()
        .is_some_and(|p| !p.is_empty());

    if changing_password || renaming {
        let current = update.current_password.as_deref().unwrap_or_default();
        if current.is_empty() {
            return Err(AppError::Validation(
                "Current password is required".to_string(),
            ));
        }
        if !auth::verify_current_password(db, &key, current)? {
            return Err(AppError::Unauthorized);
        }
    }

    let new_hash = if changing_password {
        let new_password = update.new_password.as_deref().unwrap_or_default();
        if update.confirm_password.as_deref() != Some(new_password) {
            return Err(AppError::Validation(
                "New password and confirmation do not match".to_string(),
            ));
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Some(auth::hash_password(new_password)?)
    } else {
        None
    };

    let view = db.accounts.update(|accounts| {
        let Some(mut account) = accounts.remove(&key) else {
            return Err(AppError::NotFound(format!("User {key} not found")));
        };
        if renaming && accounts.contains_key(&target) {
            accounts.insert(key.clone(), account);
            return Err(AppError::Conflict(format!(
                "Username {target} already exists"
            )));
        }
        account.name = update.name.trim().to_string();
        account.email = update.email.trim().to_string();
        if let Some(hash) = new_hash {
            account.password_hash = hash;
        }
        let view = AccountView::from_entry(&target, &account);
        accounts.insert(target.clone(), account);
        Ok(view)
    })??;

    activity::record(
        db,
        EventType::ProfileUpdated,
        &key,
        format!("Profile updated for {target}"),
    )?;
    Ok(view)
}

fn is_all_sentinel(value: &str) -> bool {
    matches!(value, "All" | "All Roles" | "All Status")
}

/// Filtered account listing. Role/status are exact matches with "All"
/// sentinels meaning no filter; the query is a case-insensitive substring
/// match against username, email, or name.
pub fn search(
    db: &Db,
    role: Option<&str>,
    status: Option<&str>,
    query: Option<&str>,
) -> Result<Vec<AccountView>, AppError> {
    let role = role.filter(|r| !is_all_sentinel(r));
    let status = status.filter(|s| !is_all_sentinel(s));
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let accounts = db.accounts.read()?;
    Ok(accounts
        .iter()
        .filter(|(_, account)| role.map_or(true, |r| account.role.as_str() == r))
        .filter(|(_, account)| status.map_or(true, |s| account.status.as_str() == s))
        .filter(|(username, account)| {
            query.as_deref().map_or(true, |q| {
                username.contains(q)
                    || account.email.to_lowercase().contains(q)
                    || account.name.to_lowercase().contains(q)
            })
        })
        .map(|(username, account)| AccountView::from_entry(username, account))
        .collect())
}

/// Startup bootstrap: guarantee the default administrator exists, is
/// unlocked, and has clean lockout counters, so the system is never
/// unrecoverable.
pub fn ensure_default_admin(db: &Db, default_password: &str) -> Result<(), AppError> {
    let password_hash = auth::hash_password(default_password)?;
    let created = db.accounts.update(|accounts| {
        match accounts.get_mut(DEFAULT_ADMIN_USERNAME) {
            Some(account) => {
                account.locked = false;
                account.status = AccountStatus::Active;
                false
            }
            None => {
                accounts.insert(
                    DEFAULT_ADMIN_USERNAME.to_string(),
                    Account {
                        password_hash,
                        name: "Administrator".to_string(),
                        role: Role::Admin,
                        ..Default::default()
                    },
                );
                true
            }
        }
    })?;
    lockout::reset(db, DEFAULT_ADMIN_USERNAME)?;
    if created {
        activity::record(
            db,
            EventType::UserCreated,
            "system",
            "Default administrator account created",
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::EventType;
    use crate::services::auth::check_credentials;

    fn seeded_db() -> Db {
        let db = Db::in_memory();
        assert!(create(&db, "alice", "Secret1", Some("alice@example.com")).unwrap());
        assert!(upsert_profile(&db, "alice", "Alice", "alice@example.com", Role::User).unwrap());
        db
    }

    #[test]
    fn create_normalizes_and_rejects_duplicates() {
        let db = Db::in_memory();
        assert!(create(&db, " Alice ", "Secret1", None).unwrap());
        assert!(!create(&db, "ALICE", "Other123", None).unwrap());
        assert!(db.accounts.read().unwrap().contains_key("alice"));
    }

    #[test]
    fn upsert_profile_resets_lock_and_status() {
        let db = seeded_db();
        db.accounts
            .update(|accounts| {
                let account = accounts.get_mut("alice").unwrap();
                account.locked = true;
                account.status = AccountStatus::Inactive;
            })
            .unwrap();

        upsert_profile(&db, "alice", "Alice B", "alice@example.com", Role::Admin).unwrap();
        let accounts = db.accounts.read().unwrap();
        let account = &accounts["alice"];
        assert!(!account.locked);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.role, Role::Admin);
        assert_eq!(account.name, "Alice B");
    }

    #[test]
    fn delete_returns_false_for_unknown_and_audits() {
        let db = seeded_db();
        assert!(!delete(&db, "ghost", "admin").unwrap());
        assert!(delete(&db, "Alice ", "admin").unwrap());
        assert!(!db.accounts.read().unwrap().contains_key("alice"));

        let records = activity::recent(&db, 10);
        assert_eq!(records[0].event_type, EventType::UserDeleted);
        assert!(records[0].description.contains("admin"));
    }

    #[test]
    fn delete_leaves_lockout_entry_behind() {
        let db = seeded_db();
        lockout::record_failure(&db, "alice").unwrap();
        delete(&db, "alice", "admin").unwrap();
        assert_eq!(lockout::get(&db, "alice").unwrap().failed_count, 1);
    }

    #[test]
    fn toggle_lock_flips_and_audits() {
        let db = seeded_db();
        assert!(toggle_lock(&db, "alice", "admin").unwrap());
        assert!(db.accounts.read().unwrap()["alice"].locked);
        assert_eq!(
            activity::recent(&db, 1)[0].event_type,
            EventType::UserLocked
        );

        assert!(toggle_lock(&db, "alice", "admin").unwrap());
        assert!(!db.accounts.read().unwrap()["alice"].locked);
        assert_eq!(
            activity::recent(&db, 1)[0].event_type,
            EventType::UserUnlocked
        );

        assert!(!toggle_lock(&db, "ghost", "admin").unwrap());
    }

    #[test]
    fn admin_unlock_clears_auto_lockout() {
        let db = seeded_db();
        for _ in 0..3 {
            check_credentials(&db, "alice", "wrong").unwrap();
        }
        // Auto-locked now. Lock then unlock via the admin toggle.
        toggle_lock(&db, "alice", "admin").unwrap();
        toggle_lock(&db, "alice", "admin").unwrap();

        // No residual lockout wait.
        let check = check_credentials(&db, "alice", "Secret1").unwrap();
        assert!(check.success);
    }

    #[test]
    fn update_profile_changes_metadata_without_password() {
        let db = seeded_db();
        let view = update_profile(
            &db,
            ProfileUpdate {
                username: "alice".to_string(),
                name: "Alice Cooper".to_string(),
                email: "cooper@example.com".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.name, "Alice Cooper");
        assert_eq!(
            activity::recent(&db, 1)[0].event_type,
            EventType::ProfileUpdated
        );
    }

    #[test]
    fn password_change_requires_current_password() {
        let db = seeded_db();
        let err = update_profile(
            &db,
            ProfileUpdate {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                new_password: Some("NewSecret1".to_string()),
                confirm_password: Some("NewSecret1".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_profile(
            &db,
            ProfileUpdate {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                current_password: Some("wrong".to_string()),
                new_password: Some("NewSecret1".to_string()),
                confirm_password: Some("NewSecret1".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn password_change_validates_confirmation_and_length() {
        let db = seeded_db();
        let base = ProfileUpdate {
            username: "alice".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            current_password: Some("Secret1".to_string()),
            ..Default::default()
        };

        let err = update_profile(
            &db,
            ProfileUpdate {
                new_password: Some("NewSecret1".to_string()),
                confirm_password: Some("different".to_string()),
                ..base.clone()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_profile(
            &db,
            ProfileUpdate {
                new_password: Some("abc".to_string()),
                confirm_password: Some("abc".to_string()),
                ..base.clone()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        update_profile(
            &db,
            ProfileUpdate {
                new_password: Some("NewSecret1".to_string()),
                confirm_password: Some("NewSecret1".to_string()),
                ..base
            },
        )
        .unwrap();
        assert!(check_credentials(&db, "alice", "NewSecret1").unwrap().success);
    }

    #[test]
    fn rename_moves_to_new_key_and_rejects_collisions() {
        let db = seeded_db();
        create(&db, "bob", "Secret2", None).unwrap();

        let err = update_profile(
            &db,
            ProfileUpdate {
                username: "alice".to_string(),
                new_username: Some("Bob".to_string()),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                current_password: Some("Secret1".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        // The failed rename left the original untouched.
        assert!(db.accounts.read().unwrap().contains_key("alice"));

        let view = update_profile(
            &db,
            ProfileUpdate {
                username: "alice".to_string(),
                new_username: Some("Alicia".to_string()),
                name: "Alicia".to_string(),
                email: "alice@example.com".to_string(),
                current_password: Some("Secret1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(view.username, "alicia");
        let accounts = db.accounts.read().unwrap();
        assert!(!accounts.contains_key("alice"));
        assert!(accounts.contains_key("alicia"));
        drop(accounts);
        assert!(check_credentials(&db, "alicia", "Secret1").unwrap().success);
    }

    #[test]
    fn search_filters_and_sentinels() {
        let db = Db::in_memory();
        create(&db, "alice", "Secret1", Some("alice@example.com")).unwrap();
        upsert_profile(&db, "alice", "Alice", "alice@example.com", Role::Admin).unwrap();
        create(&db, "bob", "Secret2", Some("bob@example.com")).unwrap();
        upsert_profile(&db, "bob", "Bob", "bob@example.com", Role::User).unwrap();
        db.accounts
            .update(|accounts| {
                accounts.get_mut("bob").unwrap().status = AccountStatus::Inactive;
            })
            .unwrap();

        assert_eq!(search(&db, None, None, None).unwrap().len(), 2);
        assert_eq!(
            search(&db, Some("All Roles"), Some("All Status"), None)
                .unwrap()
                .len(),
            2
        );

        let admins = search(&db, Some("Admin"), None, None).unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "alice");

        let inactive = search(&db, None, Some("Inactive"), None).unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].username, "bob");

        let by_email = search(&db, None, None, Some("BOB@")).unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].username, "bob");

        assert!(search(&db, None, None, Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn bootstrap_creates_admin_once_and_force_unlocks() {
        let db = Db::in_memory();
        ensure_default_admin(&db, "admin123").unwrap();
        {
            let accounts = db.accounts.read().unwrap();
            assert_eq!(accounts["admin"].role, Role::Admin);
            assert!(!accounts["admin"].locked);
        }
        assert!(check_credentials(&db, "admin", "admin123").unwrap().success);

        // Lock it out, then rerun the bootstrap: unlocked with clean counters.
        db.accounts
            .update(|accounts| accounts.get_mut("admin").unwrap().locked = true)
            .unwrap();
        for _ in 0..3 {
            lockout::record_failure(&db, "admin").unwrap();
        }
        ensure_default_admin(&db, "admin123").unwrap();
        assert!(!db.accounts.read().unwrap()["admin"].locked);
        assert_eq!(lockout::get(&db, "admin").unwrap().failed_count, 0);
        assert!(check_credentials(&db, "admin", "admin123").unwrap().success);
    }
}
