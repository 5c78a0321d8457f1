use async_trait::async_trait;
use serde::Serialize;

use super::DropRecord;
use crate::error::SenseiError;

/// How many of the highest-yield stages are considered for ranking.
pub const TOP_RATES_LIMIT: usize = 10;

/// A stage and the observed drop rate of one item on it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageRate {
    pub stage_id: String,
    pub rate: f64,
}

/// The cached drop-statistics table.
///
/// Implementations must make [`DropStore::replace_all`] atomic with respect
/// to [`DropStore::top_rates`]: readers never see a partially replaced table.
#[async_trait]
pub trait DropStore: Send + Sync {
    /// Replace the whole table with `records`. Returns the new row count.
    async fn replace_all(&self, records: Vec<DropRecord>) -> Result<usize, SenseiError>;

    /// Rates of `item_id` on every stage with at least one run, highest rate
    /// first, at most `limit` rows. Equal rates keep table order.
    async fn top_rates(&self, item_id: &str, limit: usize) -> Result<Vec<StageRate>, SenseiError>;

    /// Number of rows currently in the table.
    async fn len(&self) -> Result<usize, SenseiError>;
}
