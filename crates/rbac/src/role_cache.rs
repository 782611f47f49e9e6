//! RoleCache - Process-wide cache of loaded role documents

use shared::RoleDocument;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CacheEntry {
    role: Arc<RoleDocument>,
    inserted_at: Instant,
}

/// Role id -> role document
///
/// Read-mostly after warm-up. Concurrent inserts for the same id overwrite
/// each other; both values come from the same stored document.
#[derive(Debug, Default)]
pub struct RoleCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl RoleCache {
    /// Cache whose entries never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire `ttl` after insertion
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Get a live entry
    pub fn get(&self, role_id: &str) -> Option<Arc<RoleDocument>> {
        let entries = self.read();
        let entry = entries.get(role_id)?;
        if self.is_expired(entry) {
            return None;
        }
        Some(Arc::clone(&entry.role))
    }

    /// Store a role, replacing any previous entry
    pub fn insert(&self, role_id: impl Into<String>, role: Arc<RoleDocument>) {
        self.write().insert(
            role_id.into(),
            CacheEntry {
                role,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop one role; returns whether it was cached
    pub fn invalidate(&self, role_id: &str) -> bool {
        self.write().remove(role_id).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .map(|ttl| entry.inserted_at.elapsed() >= ttl)
            .unwrap_or(false)
    }

    // A panic while holding the lock cannot leave a half-written map behind,
    // so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
