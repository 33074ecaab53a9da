use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use course_core::model::{CourseId, UserId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (UserId, CourseId);

/// Keyed async locks serializing writes to one (user, course) aggregate.
///
/// Writers on different aggregates never contend. Idle entries are pruned on
/// each acquisition.
#[derive(Debug, Default)]
pub struct AggregateLocks {
    slots: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl AggregateLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the aggregate; released on drop.
    pub async fn acquire(&self, user_id: UserId, course_id: CourseId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry((user_id, course_id)).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of aggregates currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_aggregate_is_exclusive() {
        let locks = Arc::new(AggregateLocks::new());
        let guard = locks.acquire(UserId::new(1), CourseId::new(1)).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(UserId::new(1), CourseId::new(1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_aggregates_do_not_block() {
        let locks = AggregateLocks::new();
        let _a = locks.acquire(UserId::new(1), CourseId::new(1)).await;
        let _b = locks.acquire(UserId::new(1), CourseId::new(2)).await;
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = AggregateLocks::new();
        drop(locks.acquire(UserId::new(1), CourseId::new(1)).await);
        drop(locks.acquire(UserId::new(2), CourseId::new(1)).await);
        assert_eq!(locks.tracked(), 1);
    }
}
