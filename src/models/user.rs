//! Account model with role-based access control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

/// Administrative status, independent of the `locked` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }
}

/// Stored account record. The store is keyed by normalized username, so the
/// username itself does not appear here. All fields are defaulted so minimal
/// records (password_hash only) still parse.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Account {
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub twofa: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Account projection for API responses — excludes password_hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub locked: bool,
    pub twofa: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl AccountView {
    pub fn from_entry(username: &str, account: &Account) -> Self {
        Self {
            username: username.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            status: account.status,
            locked: account.locked,
            twofa: account.twofa,
            last_login: account.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"Admin\"");
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn minimal_record_parses() {
        let account: Account =
            serde_json::from_str(r#"{"password_hash": "abc"}"#).unwrap();
        assert_eq!(account.password_hash, "abc");
        assert_eq!(account.role, Role::User);
        assert_eq!(account.status, AccountStatus::Active);
        assert!(!account.locked);
        assert!(account.last_login.is_none());
    }

    #[test]
    fn account_view_excludes_password() {
        let account = Account {
            password_hash: "secret_hash".to_string(),
            email: "a@b.com".to_string(),
            ..Default::default()
        };
        let json =
            serde_json::to_string(&AccountView::from_entry("alice", &account)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
        assert!(json.contains("alice"));
    }
}
