//! Periodic refresh of the drop table from the feed.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use super::{DropFeed, DropStore};
use crate::error::SenseiError;

/// Reference refresh period: hourly.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Result of one refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// The table now holds exactly the fetched matrix.
    Replaced { rows: usize },
    /// Fetch or store failed; the previous table is untouched.
    Failed,
}

pub struct Ingestor {
    feed: Arc<dyn DropFeed>,
    store: Arc<dyn DropStore>,
}

impl Ingestor {
    pub fn new(feed: Arc<dyn DropFeed>, store: Arc<dyn DropStore>) -> Self {
        Self { feed, store }
    }

    /// Fetch the matrix and atomically replace the table with it.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`RefreshStatus::Failed`].
    pub async fn refresh(&self) -> RefreshStatus {
        match self.try_refresh().await {
            Ok(rows) => {
                tracing::info!(rows, "drop matrix refreshed");
                RefreshStatus::Replaced { rows }
            }
            Err(e) => {
                tracing::error!(error = %e, "drop matrix refresh failed");
                RefreshStatus::Failed
            }
        }
    }

    async fn try_refresh(&self) -> Result<usize, SenseiError> {
        // The fetch completes before the store is touched.
        let matrix = self.feed.fetch().await?;
        self.store.replace_all(matrix.matrix).await
    }

    /// Refresh immediately, then once per `interval`, forever.
    ///
    /// A slow refresh delays the following ticks instead of bunching them.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures: u32 = 0;

        loop {
            ticker.tick().await;
            match self.refresh().await {
                RefreshStatus::Replaced { .. } => consecutive_failures = 0,
                RefreshStatus::Failed => {
                    consecutive_failures += 1;
                    if consecutive_failures == 3 {
                        tracing::warn!(
                            failures = consecutive_failures,
                            "drop matrix refresh keeps failing, serving stale data"
                        );
                    }
                }
            }
        }
    }

    /// Run [`Ingestor::run`] on a background task.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(interval).await })
    }
}
