use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Entries kept before the oldest description is evicted.
pub const DEFAULT_CAPACITY: usize = 256;

/// Completed image descriptions keyed by request id.
pub struct DescriptionCache {
    inner: RwLock<Entries>,
    capacity: usize,
}

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, String>,
    order: VecDeque<String>,
}

impl Default for DescriptionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DescriptionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Store (or replace) the description for `request_id`.
    pub async fn insert(&self, request_id: impl Into<String>, description: impl Into<String>) {
        let request_id = request_id.into();
        let mut entries = self.inner.write().await;

        if entries
            .by_id
            .insert(request_id.clone(), description.into())
            .is_none()
        {
            entries.order.push_back(request_id);
        }

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.by_id.remove(&oldest);
            }
        }
    }

    pub async fn get(&self, request_id: &str) -> Option<String> {
        self.inner.read().await.by_id.get(request_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
