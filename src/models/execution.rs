//! Record of an executed copy trade.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Trade, TradeAction};

/// One copy trade routed to a (simulated) brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyExecution {
    pub id: String,
    pub original_trade_id: u64,
    pub ticker: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub price: Decimal,
    /// Brokerage display name at execution time
    pub brokerage: String,
    pub executed_at: DateTime<Utc>,
}

impl CopyExecution {
    pub fn new(trade: &Trade, quantity: u32, brokerage: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_trade_id: trade.id,
            ticker: trade.ticker.clone(),
            action: trade.action,
            quantity,
            price: trade.price,
            brokerage,
            executed_at: Utc::now(),
        }
    }

    /// Confirmation text shown in the notification banner.
    pub fn confirmation(&self) -> String {
        format!(
            "✓ Copy Trade Executed: {} {} {} @ ${}",
            self.action,
            self.quantity,
            self.ticker,
            self.price.normalize()
        )
    }
}
