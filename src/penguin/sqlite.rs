//! SQLite-backed drop table, for hosts that want the matrix to survive
//! restarts.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    QueryBuilder, Sqlite,
};

use super::{DropRecord, DropStore, StageRate};
use crate::error::SenseiError;

/// Rows per multi-row INSERT; 7 binds each stays well under SQLite's
/// host-parameter limit.
const INSERT_CHUNK: usize = 100;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS penguin_data (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    stageId  TEXT,
    itemId   TEXT,
    times    INTEGER,
    quantity INTEGER,
    stdDev   REAL,
    start    INTEGER,
    "end"    INTEGER
);
CREATE INDEX IF NOT EXISTS penguin_data_item ON penguin_data (itemId);
"#;

#[derive(Debug, Clone)]
pub struct SqliteDropStore {
    pool: SqlitePool,
}

impl SqliteDropStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://penguin.db`, and ensure the table exists.
    pub async fn connect(url: &str) -> Result<Self, SenseiError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database. The pool keeps exactly one connection
    /// alive for its whole life, since the data dies with the connection.
    pub async fn in_memory() -> Result<Self, SenseiError> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, SenseiError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DropStore for SqliteDropStore {
    async fn replace_all(&self, records: Vec<DropRecord>) -> Result<usize, SenseiError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM penguin_data")
            .execute(&mut *tx)
            .await?;

        for chunk in records.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                r#"INSERT INTO penguin_data (stageId, itemId, times, quantity, stdDev, start, "end") "#,
            );
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.stage_id.clone())
                    .push_bind(record.item_id.clone())
                    .push_bind(record.times)
                    .push_bind(record.quantity)
                    .push_bind(record.std_dev)
                    .push_bind(record.start)
                    .push_bind(record.end);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(records.len())
    }

    async fn top_rates(&self, item_id: &str, limit: usize) -> Result<Vec<StageRate>, SenseiError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT stageId, (quantity * 1.0) / (times * 1.0) AS rate \
             FROM penguin_data \
             WHERE itemId = ? AND times > 0 \
             ORDER BY rate DESC, id ASC \
             LIMIT ?",
        )
        .bind(item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(stage_id, rate)| StageRate { stage_id, rate })
            .collect())
    }

    async fn len(&self) -> Result<usize, SenseiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penguin_data")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penguin::record;

    #[tokio::test]
    async fn replace_and_query_in_memory() {
        let store = SqliteDropStore::in_memory().await.unwrap();
        store
            .replace_all(vec![
                record("main_01-07", "30012", 100, 120),
                record("main_02-05", "30012", 100, 60),
                record("wk_toxic_5", "30012", 0, 0),
                record("main_03-01", "30013", 100, 90),
            ])
            .await
            .unwrap();

        let rates = store.top_rates("30012", 10).await.unwrap();
        assert_eq!(
            rates,
            vec![
                StageRate {
                    stage_id: "main_01-07".into(),
                    rate: 1.2
                },
                StageRate {
                    stage_id: "main_02-05".into(),
                    rate: 0.6
                },
            ]
        );
        assert_eq!(store.len().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn replace_truncates_previous_rows() {
        let store = SqliteDropStore::in_memory().await.unwrap();
        store
            .replace_all(vec![record("old", "30012", 1, 1)])
            .await
            .unwrap();
        store
            .replace_all(vec![record("new", "30012", 2, 1)])
            .await
            .unwrap();

        let rates = store.top_rates("30012", 10).await.unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].stage_id, "new");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn bulk_insert_spans_chunks() {
        let store = SqliteDropStore::in_memory().await.unwrap();
        let records: Vec<_> = (0..250)
            .map(|i| record(&format!("s{i}"), "30012", 1000, i))
            .collect();
        assert_eq!(store.replace_all(records).await.unwrap(), 250);
        assert_eq!(store.len().await.unwrap(), 250);

        let rates = store.top_rates("30012", 10).await.unwrap();
        assert_eq!(rates.len(), 10);
        assert_eq!(rates[0].stage_id, "s249");
    }

    #[tokio::test]
    async fn file_database_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("penguin.db").display());

        let store = SqliteDropStore::connect(&url).await.unwrap();
        store
            .replace_all(vec![record("main_01-07", "30012", 10, 5)])
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteDropStore::connect(&url).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_see_full_table_while_file_database_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("penguin.db").display());
        let store = std::sync::Arc::new(SqliteDropStore::connect(&url).await.unwrap());
        let rows = || -> Vec<_> {
            (0..500)
                .map(|i| record(&format!("s{i}"), "30012", 100 + i, 50))
                .collect()
        };
        store.replace_all(rows()).await.unwrap();

        let writer = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                for _ in 0..50 {
                    assert_eq!(store.replace_all(rows()).await.unwrap(), 500);
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..3 {
            let store = std::sync::Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let rates = store.top_rates("30012", 10).await.unwrap();
                    assert_eq!(rates.len(), 10);
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 500);
    }
}
