//! Per-class async mutexes.
//!
//! Every compound step that reads and then writes a class's seats or
//! waitlist (capacity check plus insert, enqueue, cancel plus cascade,
//! renumbering) runs while holding the class's lock. Steps for different
//! classes never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::ClassId;

/// Idle locks are dropped from the map once it grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of per-class locks.
#[derive(Debug, Clone, Default)]
pub struct ClassLocks {
    locks: Arc<Mutex<HashMap<ClassId, Arc<Mutex<()>>>>>,
}

impl ClassLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `class_id`.
    ///
    /// The lock is released when the guard is dropped.
    pub async fn acquire(&self, class_id: ClassId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(class_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of classes with a registered lock.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_class_is_exclusive() {
        let locks = ClassLocks::new();
        let class = ClassId::new();
        let inside = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(class).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_classes_do_not_block() {
        let locks = ClassLocks::new();
        let _first = locks.acquire(ClassId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(ClassId::new())).await;
        assert!(second.is_ok());
        assert_eq!(locks.tracked().await, 2);
    }

    #[tokio::test]
    async fn lock_is_released_on_drop() {
        let locks = ClassLocks::new();
        let class = ClassId::new();
        drop(locks.acquire(class).await);
        let again = tokio::time::timeout(Duration::from_millis(100), locks.acquire(class)).await;
        assert!(again.is_ok());
    }
}
