//! Per-user serialization of progression changes

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async mutex per user id
///
/// Different users never contend. Entries are pruned once no caller holds
/// or waits on them.
#[derive(Debug, Default)]
pub struct UserLockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s progression.
    pub async fn acquire(&self, user_id: &str) -> UserLockGuard<'_> {
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        UserLockGuard { registry: self, user_id: user_id.to_string(), guard: Some(guard) }
    }

    /// Number of users currently tracked.
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }

    fn release(&self, user_id: &str) {
        // The map's own handle is the only one left once nobody waits.
        self.locks.remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Exclusive access to one user's progression, released on drop
pub struct UserLockGuard<'a> {
    registry: &'a UserLockRegistry,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        // The owned guard holds an Arc clone; drop it before pruning.
        drop(self.guard.take());
        self.registry.release(&self.user_id);
    }
}
