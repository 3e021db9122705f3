use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::registry::{BuildOptions, Registry};
use crate::snapshot::SnapshotSet;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Source of "now" for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(delta) = chrono::TimeDelta::from_std(by) {
            *now += delta;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Session id → registry, with lazy TTL expiry on read.
///
/// Sessions never see each other's registries. Storing twice for one session
/// replaces the earlier registry.
pub struct RegistryStore {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, Arc<Registry>>>,
}

impl RegistryStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_SESSION_TTL)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Registry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds a registry stamped with the store's clock and stores it.
    pub fn discover(
        &self,
        session_id: &str,
        snapshots: &SnapshotSet,
        options: &BuildOptions,
    ) -> Result<Arc<Registry>> {
        let registry = Registry::build(snapshots, options, self.now())?;
        Ok(self.store(session_id, registry))
    }

    pub fn store(&self, session_id: &str, registry: Registry) -> Arc<Registry> {
        let registry = Arc::new(registry);
        let replaced = self
            .lock()
            .insert(session_id.to_string(), Arc::clone(&registry))
            .is_some();
        log::debug!("stored registry for session {session_id} (replaced={replaced})");
        registry
    }

    /// `None` when the session never stored a registry or its TTL has passed.
    pub fn get(&self, session_id: &str) -> Option<Arc<Registry>> {
        let now = self.now();
        let mut entries = self.lock();
        let registry = entries.get(session_id)?;
        if registry.is_stale(now, self.ttl) {
            log::warn!(
                "registry for session {session_id} expired after {:?}",
                registry.age(now)
            );
            entries.remove(session_id);
            return None;
        }
        Some(Arc::clone(registry))
    }

    /// Returns whether a registry was removed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    /// Stored sessions, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore")
            .field("ttl", &self.ttl)
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}
