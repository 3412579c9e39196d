//! Database persistence for executed copy trades.
//!
//! The dashboard keeps its own in-memory history for the session; this
//! store lets the CLI show history across sessions.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::CopyExecution;

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

/// Stored copy execution record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredExecution {
    pub id: String,
    pub original_trade_id: i64,
    pub ticker: String,
    pub action: String,
    pub quantity: i64,
    pub price: String,
    pub brokerage: String,
    pub executed_at: String,
}

/// Aggregate execution counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    pub total: i64,
    pub buys: i64,
    pub sells: i64,
    pub shares: i64,
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Single-connection in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS copy_executions (
                id TEXT PRIMARY KEY,
                original_trade_id INTEGER NOT NULL,
                ticker TEXT NOT NULL,
                action TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price TEXT NOT NULL,
                brokerage TEXT NOT NULL,
                executed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_copy_executions_time ON copy_executions(executed_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record an executed copy trade.
    pub async fn save_execution(&self, execution: &CopyExecution) -> Result<()> {
        let trade_id = i64::try_from(execution.original_trade_id)
            .context("Trade id does not fit in an INTEGER column")?;

        sqlx::query(
            r#"
            INSERT INTO copy_executions (
                id, original_trade_id, ticker, action, quantity, price, brokerage, executed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&execution.id)
        .bind(trade_id)
        .bind(&execution.ticker)
        .bind(execution.action.as_str())
        .bind(i64::from(execution.quantity))
        .bind(execution.price.to_string())
        .bind(&execution.brokerage)
        .bind(execution.executed_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save copy execution")?;

        Ok(())
    }

    /// Most recent executions first.
    pub async fn recent_executions(&self, limit: i64) -> Result<Vec<StoredExecution>> {
        sqlx::query_as::<_, StoredExecution>(
            "SELECT * FROM copy_executions ORDER BY executed_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch copy executions")
    }

    /// Get execution statistics.
    pub async fn execution_stats(&self) -> Result<ExecutionStats> {
        let (total, buys, sells, shares): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN action = 'BUY' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN action = 'SELL' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(quantity), 0)
            FROM copy_executions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ExecutionStats {
            total,
            buys,
            sells,
            shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Trade, TradeAction};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use tokio_test::assert_ok;

    fn execution(ticker: &str, action: TradeAction, quantity: u32) -> CopyExecution {
        let trade = Trade::new(1, ticker, action, 100, dec!(178.50), Utc::now());
        CopyExecution::new(&trade, quantity, "Robinhood".to_string())
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let db = assert_ok!(Database::in_memory().await);

        let mut older = execution("AAPL", TradeAction::Buy, 50);
        older.executed_at = Utc::now() - Duration::minutes(5);
        let newer = execution("TSLA", TradeAction::Sell, 10);

        assert_ok!(db.save_execution(&older).await);
        assert_ok!(db.save_execution(&newer).await);

        let rows = assert_ok!(db.recent_executions(10).await);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "TSLA");
        assert_eq!(rows[1].price, "178.50");
        assert_eq!(rows[1].quantity, 50);
    }

    #[tokio::test]
    async fn test_stats() {
        let db = assert_ok!(Database::in_memory().await);
        assert_eq!(assert_ok!(db.execution_stats().await), ExecutionStats::default());

        assert_ok!(db.save_execution(&execution("AAPL", TradeAction::Buy, 50)).await);
        assert_ok!(db.save_execution(&execution("NVDA", TradeAction::Buy, 20)).await);
        assert_ok!(db.save_execution(&execution("MSFT", TradeAction::Sell, 5)).await);

        let stats = assert_ok!(db.execution_stats().await);
        assert_eq!(
            stats,
            ExecutionStats {
                total: 3,
                buys: 2,
                sells: 1,
                shares: 75,
            }
        );
    }
}
