//! TTL cache for learner profiles. Profile loads sit on every feed request,
//! so a short-lived cache keeps the profile service off the hot path.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::types::LearnerProfile;

struct CacheEntry {
    profile: LearnerProfile,
    expires_at: Instant,
}

pub struct ProfileCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    /// Expired entries are swept once the map grows past this size.
    prune_threshold: usize,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            prune_threshold: crate::constants::PROFILE_CACHE_PRUNE_THRESHOLD,
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<LearnerProfile> {
        let entries = self.entries.read().await;
        entries
            .get(user_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.profile.clone())
    }

    pub async fn put(&self, profile: LearnerProfile) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.prune_threshold {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            profile.user_id.clone(),
            CacheEntry {
                profile,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops the cached entry, forcing the next read through to the store.
    /// Called after any profile mutation so stale state never outlives a
    /// write.
    pub async fn invalidate(&self, user_id: &str) {
        self.entries.write().await.remove(user_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
