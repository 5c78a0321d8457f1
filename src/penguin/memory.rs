//! In-process drop table backed by an immutable, swappable snapshot.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{DropRecord, DropStore, StageRate};
use crate::error::SenseiError;

/// Holds the current matrix behind an `Arc`. A refresh builds the new vector
/// completely, then swaps the pointer; readers clone the `Arc` and scan
/// without holding the lock.
#[derive(Debug, Default)]
pub struct MemoryDropStore {
    snapshot: RwLock<Arc<Vec<DropRecord>>>,
}

impl MemoryDropStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<DropRecord>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(records)),
        }
    }

    fn snapshot(&self) -> Arc<Vec<DropRecord>> {
        // A poisoned lock still guards a complete snapshot; only the pointer
        // is ever written under it.
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl DropStore for MemoryDropStore {
    async fn replace_all(&self, records: Vec<DropRecord>) -> Result<usize, SenseiError> {
        let rows = records.len();
        let next = Arc::new(records);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        Ok(rows)
    }

    async fn top_rates(&self, item_id: &str, limit: usize) -> Result<Vec<StageRate>, SenseiError> {
        let snapshot = self.snapshot();
        let mut rates: Vec<StageRate> = snapshot
            .iter()
            .filter(|r| r.item_id == item_id)
            .filter_map(|r| {
                r.rate().map(|rate| StageRate {
                    stage_id: r.stage_id.clone(),
                    rate,
                })
            })
            .collect();
        // Stable sort: equal rates keep table order.
        rates.sort_by(|a, b| b.rate.total_cmp(&a.rate));
        rates.truncate(limit);
        Ok(rates)
    }

    async fn len(&self) -> Result<usize, SenseiError> {
        Ok(self.snapshot().len())
    }
}
