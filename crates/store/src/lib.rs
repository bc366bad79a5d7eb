use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use common::Result;

/// Abstraction over subscriber persistence.
///
/// `JsonFileStorage` implements this with a single JSON file. Persistence is
/// best-effort by design: on ephemeral filesystems the file may disappear
/// between restarts, which degrades to "no subscribers" rather than a crash.
pub trait SubscriberStorage: Send + Sync {
    /// Load the persisted set. Missing or corrupt storage yields an empty set.
    fn load(&self) -> HashSet<i64>;

    /// Persist the full set, replacing whatever was stored before.
    fn save(&self, ids: &HashSet<i64>) -> Result<()>;
}

/// Subscriber ids in a single JSON array, rewritten whole on each mutation.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubscriberStorage for JsonFileStorage {
    fn load(&self) -> HashSet<i64> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return HashSet::new();
        };
        match serde_json::from_str::<Vec<i64>>(&content) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e,
                    "Subscribers file corrupt, starting with empty set");
                HashSet::new()
            }
        }
    }

    fn save(&self, ids: &HashSet<i64>) -> Result<()> {
        let mut sorted: Vec<i64> = ids.iter().copied().collect();
        sorted.sort_unstable();
        let json = serde_json::to_string_pretty(&sorted)?;
        // Write-then-rename so a crash mid-write never leaves a torn file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Shared, cloneable handle to the subscriber set.
///
/// Mutations update the in-memory set under a coarse lock and persist
/// best-effort; a save failure is logged and swallowed.
#[derive(Clone)]
pub struct Subscribers {
    inner: Arc<RwLock<HashSet<i64>>>,
    storage: Arc<dyn SubscriberStorage>,
}

impl Subscribers {
    pub fn load(storage: Arc<dyn SubscriberStorage>) -> Self {
        let initial = storage.load();
        info!(count = initial.len(), "Loaded subscribers");
        Self {
            inner: Arc::new(RwLock::new(initial)),
            storage,
        }
    }

    /// Returns `false` if `id` was already subscribed.
    pub async fn add(&self, id: i64) -> bool {
        let mut set = self.inner.write().await;
        let inserted = set.insert(id);
        if inserted {
            self.persist(&set);
        }
        inserted
    }

    /// Returns `false` if `id` was not subscribed. A no-op removal is not
    /// an error.
    pub async fn remove(&self, id: i64) -> bool {
        let mut set = self.inner.write().await;
        let removed = set.remove(&id);
        if removed {
            self.persist(&set);
        }
        removed
    }

    pub async fn contains(&self, id: i64) -> bool {
        self.inner.read().await.contains(&id)
    }

    /// Current recipients, for alert fan-out.
    pub async fn snapshot(&self) -> Vec<i64> {
        self.inner.read().await.iter().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    fn persist(&self, set: &HashSet<i64>) {
        if let Err(e) = self.storage.save(set) {
            warn!(error = %e, "Failed to persist subscribers, keeping in-memory set");
        }
    }
}
