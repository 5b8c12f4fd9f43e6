use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::CalendarId;

/// One async mutex per calendar, serializing conflict-check-then-insert.
#[derive(Clone, Default)]
pub struct CalendarLocks {
    inner: Arc<DashMap<CalendarId, Arc<Mutex<()>>>>,
}

impl CalendarLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, calendar_id: CalendarId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.inner.entry(calendar_id).or_default());
        lock.lock_owned().await
    }

    /// Drops the lock entry of a deleted calendar.
    pub fn forget(&self, calendar_id: CalendarId) {
        self.inner.remove(&calendar_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
