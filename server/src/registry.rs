use std::time::{Duration, Instant};

use dashmap::DashMap;
use cloning_core::PackagedResult;

struct StoredArchive {
    result: PackagedResult,
    created_at: Instant,
}

/// Job-id to archive mapping backing `/download/{id}`.
///
/// Entries are evicted on retrieval, and stale entries are swept on every
/// insert. Dropping an entry drops its [`PackagedResult`], which deletes
/// the job's working directory and archive from disk.
pub struct ArchiveRegistry {
    entries: DashMap<String, StoredArchive>,
    ttl: Duration,
}

impl ArchiveRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Store a finished job and return its download id.
    pub fn insert(&self, result: PackagedResult) -> String {
        self.sweep();
        let id = uuid::Uuid::new_v4().to_string();
        self.entries.insert(
            id.clone(),
            StoredArchive {
                result,
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Remove and return the archive for `id`, if present and unexpired.
    pub fn take(&self, id: &str) -> Option<PackagedResult> {
        let (_, stored) = self.entries.remove(id)?;
        if stored.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some(stored.result)
    }

    fn sweep(&self) {
        self.entries
            .retain(|_, stored| stored.created_at.elapsed() < self.ttl);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
