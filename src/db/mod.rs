//! Storage layer: named JSON document stores behind an injected backend.
//!
//! Each durable store (accounts, lockout counters, activity log, check-in
//! log) is a single JSON document accessed via full read-modify-write
//! cycles. A [`Store`] serializes those cycles behind its own mutex, so a
//! single `update` call is atomic with respect to other callers on the same
//! store. The backend trait allows an in-memory fake for tests.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::activity::ActivityRecord;
use crate::models::checkin::CheckinRecord;
use crate::models::lockout::LockoutState;
use crate::models::user::Account;

pub type AccountMap = BTreeMap<String, Account>;
pub type LockoutMap = BTreeMap<String, LockoutState>;

/// Raw persistence for named stores.
pub trait StorageBackend: Send + Sync {
    /// Returns `None` if the store has never been written.
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, AppError>;
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), AppError>;
}

/// One pretty-printed JSON file per store under a data directory.
pub struct JsonFileBackend {
    root: PathBuf,
}

impl JsonFileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read(&path)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("{}: read failed: {e}", path.display())))
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| AppError::Storage(format!("{}: mkdir failed: {e}", self.root.display())))?;
        let path = self.path(name);
        // Write to a sibling temp file first so a crash mid-write never
        // truncates the live store.
        let tmp = self.root.join(format!("{name}.json.tmp"));
        std::fs::write(&tmp, bytes)
            .map_err(|e| AppError::Storage(format!("{}: write failed: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| AppError::Storage(format!("{}: rename failed: {e}", path.display())))
    }
}

/// In-memory backend for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("memory backend lock poisoned".to_string()))?;
        Ok(entries.get(name).cloned())
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("memory backend lock poisoned".to_string()))?;
        entries.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Backend whose writes always fail, for exercising storage error paths.
#[cfg(test)]
pub(crate) struct FailingBackend;

#[cfg(test)]
impl StorageBackend for FailingBackend {
    fn load(&self, _name: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(None)
    }

    fn save(&self, name: &str, _bytes: &[u8]) -> Result<(), AppError> {
        Err(AppError::Storage(format!("{name}: write refused")))
    }
}

/// Typed handle over a named store.
pub struct Store<T> {
    name: &'static str,
    backend: Arc<dyn StorageBackend>,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            backend: self.backend.clone(),
            lock: self.lock.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned + Default> Store<T> {
    fn new(name: &'static str, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            name,
            backend,
            lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    fn load_inner(&self) -> Result<T, AppError> {
        match self.backend.load(self.name)? {
            None => Ok(T::default()),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::Storage(format!("{}: corrupt store: {e}", self.name))),
        }
    }

    fn save_inner(&self, value: &T) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::Internal(format!("{}: serialize failed: {e}", self.name)))?;
        self.backend.save(self.name, &bytes)
    }

    /// Load the current contents. A never-written store reads as default;
    /// an unreadable one surfaces `StorageUnavailable`.
    pub fn read(&self) -> Result<T, AppError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AppError::Storage(format!("{}: lock poisoned", self.name)))?;
        self.load_inner()
    }

    /// Fail-open read for non-critical paths: any failure logs a warning
    /// and yields the empty default.
    pub fn read_or_default(&self) -> T {
        self.read().unwrap_or_else(|e| {
            tracing::warn!(store = self.name, error = %e, "store read failed, treating as empty");
            T::default()
        })
    }

    /// Atomic read-modify-write cycle: takes the store mutex, loads,
    /// applies `f`, and persists. Write failures always surface.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, AppError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AppError::Storage(format!("{}: lock poisoned", self.name)))?;
        let mut value = self.load_inner()?;
        let out = f(&mut value);
        self.save_inner(&value)?;
        Ok(out)
    }

    /// Like [`Store::update`] but a corrupt or unreadable store starts from
    /// the empty default instead of failing. Only used for the append-only
    /// logs, where losing an unreadable file beats refusing new entries.
    pub fn update_or_default<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, AppError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AppError::Storage(format!("{}: lock poisoned", self.name)))?;
        let mut value = self.load_inner().unwrap_or_else(|e| {
            tracing::warn!(store = self.name, error = %e, "store read failed, rewriting from empty");
            T::default()
        });
        let out = f(&mut value);
        self.save_inner(&value)?;
        Ok(out)
    }
}

/// Bundle of the four typed stores sharing one backend. Cheap to clone.
#[derive(Clone)]
pub struct Db {
    pub accounts: Store<AccountMap>,
    pub lockouts: Store<LockoutMap>,
    pub activity: Store<Vec<ActivityRecord>>,
    pub checkins: Store<Vec<CheckinRecord>>,
    /// Serializes full credential checks (spanning accounts + lockouts)
    /// so concurrent failed attempts never lose an increment.
    pub(crate) auth_gate: Arc<Mutex<()>>,
}

impl Db {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            accounts: Store::new("users", backend.clone()),
            lockouts: Store::new("login_attempts", backend.clone()),
            activity: Store::new("activity_log", backend.clone()),
            checkins: Store::new("checkin_log", backend),
            auth_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Open a JSON-file backed database rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(data_dir)))
    }

    /// In-memory database, used by unit tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }
}
