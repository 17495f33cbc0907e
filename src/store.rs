use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

use crate::error::StoreError;
use crate::types::{BridgeDirection, BridgeTransaction, LifecycleStatus};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS bridge_transactions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    tx_hash     TEXT    NOT NULL UNIQUE,
    direction   INTEGER NOT NULL,
    stage       INTEGER NOT NULL,
    outcome     INTEGER,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
)
"#;

/// Durable table of tracked transfers, keyed by transaction hash. The only
/// place lifecycle status is recorded.
#[derive(Clone)]
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` opens a fresh database, so keep one alive.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(10)
                .connect_with(options)
                .await?
        };

        let store = TransactionStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Creates the row for `tx_hash`. A second insert for the same hash fails
    /// with [`StoreError::DuplicateKey`].
    pub async fn insert(
        &self,
        tx_hash: B256,
        direction: BridgeDirection,
        status: LifecycleStatus,
    ) -> Result<BridgeTransaction, StoreError> {
        let now = Utc::now();
        let (stage, outcome) = status.to_columns();

        let result = sqlx::query(
            "INSERT INTO bridge_transactions (tx_hash, direction, stage, outcome, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tx_hash.to_string())
        .bind(direction.code())
        .bind(stage)
        .bind(outcome)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateKey(tx_hash)
            }
            other => StoreError::Database(other),
        })?;

        debug!(%tx_hash, ?status, "Inserted bridge transaction");

        Ok(BridgeTransaction {
            id: result.last_insert_rowid(),
            tx_hash,
            direction,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    /// `Ok(None)` when the hash is not tracked.
    pub async fn get_by_tx_hash(
        &self,
        tx_hash: B256,
    ) -> Result<Option<BridgeTransaction>, StoreError> {
        let row = sqlx::query(
            "SELECT id, tx_hash, direction, stage, outcome, created_at, updated_at \
             FROM bridge_transactions WHERE tx_hash = ?",
        )
        .bind(tx_hash.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_row(&row)).transpose()
    }

    /// Moves the row to `status` if that is a forward transition. Returns
    /// whether a write happened; unknown hashes and backward or sideways
    /// moves are no-ops.
    pub async fn update_status(
        &self,
        tx_hash: B256,
        status: LifecycleStatus,
    ) -> Result<bool, StoreError> {
        let (stage, outcome) = status.to_columns();

        let result = sqlx::query(
            "UPDATE bridge_transactions \
             SET stage = ?, outcome = COALESCE(?, outcome), updated_at = ? \
             WHERE tx_hash = ? AND stage < ?",
        )
        .bind(stage)
        .bind(outcome)
        .bind(Utc::now().to_rfc3339())
        .bind(tx_hash.to_string())
        .bind(status.stage())
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        debug!(%tx_hash, ?status, changed, "Status update");
        Ok(changed)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bridge_transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_row(row: &SqliteRow) -> Result<BridgeTransaction, StoreError> {
    let raw_hash: String = row.try_get("tx_hash")?;
    let corrupt = |reason: String| StoreError::CorruptRow {
        tx_hash: raw_hash.clone(),
        reason,
    };

    let tx_hash = B256::from_str(&raw_hash).map_err(|e| corrupt(e.to_string()))?;

    let direction_code: i64 = row.try_get("direction")?;
    let direction = BridgeDirection::from_code(direction_code)
        .ok_or_else(|| corrupt(format!("unknown direction {direction_code}")))?;

    let stage: i64 = row.try_get("stage")?;
    let outcome: Option<i64> = row.try_get("outcome")?;
    let status = LifecycleStatus::from_columns(stage, outcome)
        .ok_or_else(|| corrupt(format!("invalid status ({stage}, {outcome:?})")))?;

    let parse_time = |column: &str| -> Result<DateTime<Utc>, StoreError> {
        let raw: String = row.try_get(column)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| corrupt(format!("{column}: {e}")))
    };

    Ok(BridgeTransaction {
        id: row.try_get("id")?,
        tx_hash,
        direction,
        status,
        created_at: parse_time("created_at")?,
        updated_at: parse_time("updated_at")?,
    })
}
