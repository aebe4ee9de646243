use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// In-memory lock table keyed by job id. Entries are created on demand and
/// dropped again once nobody holds or waits for them.
#[derive(Debug, Default)]
pub struct JobLocks {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: Uuid) -> JobLockGuard<'_> {
        let slot = self.slots().entry(id).or_default().clone();
        let guard = slot.lock_owned().await;
        JobLockGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    /// True while some task holds or waits for `id`.
    pub fn is_held(&self, id: Uuid) -> bool {
        self.slots().contains_key(&id)
    }

    /// Number of ids currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots().len()
    }
}

pub struct JobLockGuard<'a> {
    locks: &'a JobLocks,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for JobLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut slots = self.locks.slots();
        if let Some(slot) = slots.get(&self.id)
            && Arc::strong_count(slot) == 1
        {
            slots.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_id_is_serialized() {
        let locks = Arc::new(JobLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let (locks, inside, max_seen) = (locks.clone(), inside.clone(), max_seen.clone());
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(id).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = JobLocks::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let _a = locks.lock(a).await;
        let guard_b = locks.lock(b).await;
        assert_eq!(locks.active(), 2);
        assert!(locks.is_held(b));

        drop(guard_b);
        assert!(!locks.is_held(b));
        assert!(locks.is_held(a));
    }
}
