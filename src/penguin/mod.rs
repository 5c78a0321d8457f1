//! Penguin Statistics drop data: the record types, the feed that serves
//! them, the table that caches them, and the ingestor that keeps the table
//! fresh.
//!
//! The table is always a complete snapshot. Every [`DropStore`] replaces its
//! contents in one atomic step, so a concurrent reader sees either the old
//! matrix or the new one.

mod feed;
mod ingest;
mod memory;
mod sqlite;
mod store;

pub use feed::{DropFeed, HttpDropFeed, StaticDropFeed, DEFAULT_PENGUIN_URL};
pub use ingest::{Ingestor, RefreshStatus, DEFAULT_REFRESH_INTERVAL};
pub use memory::MemoryDropStore;
pub use sqlite::SqliteDropStore;
pub use store::{DropStore, StageRate, TOP_RATES_LIMIT};

use serde::{Deserialize, Serialize};

/// One aggregated observation: `quantity` units seen over `times` runs of
/// `stage_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DropRecord {
    pub stage_id: String,
    pub item_id: String,
    pub times: i64,
    pub quantity: i64,
    #[serde(default)]
    pub std_dev: f64,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl DropRecord {
    /// Observed units per run, or `None` when the stage was never run.
    pub fn rate(&self) -> Option<f64> {
        (self.times > 0).then(|| self.quantity as f64 / self.times as f64)
    }
}

/// Body of the feed's matrix endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DropMatrix {
    pub matrix: Vec<DropRecord>,
}

#[cfg(test)]
pub(crate) fn record(stage_id: &str, item_id: &str, times: i64, quantity: i64) -> DropRecord {
    DropRecord {
        stage_id: stage_id.to_string(),
        item_id: item_id.to_string(),
        times,
        quantity,
        std_dev: 0.0,
        start: Some(1_556_676_000_000),
        end: None,
    }
}
