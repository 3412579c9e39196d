//! Trade model representing a master trader's buy/sell event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Comment;

pub const DEFAULT_TRADER_NAME: &str = "Master Trader";
pub const DEFAULT_TRADER_AVATAR: &str = "👤";

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trade published by the followed trader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier, derived from the creation time in milliseconds
    pub id: u64,

    /// Ticker symbol (e.g. "AAPL")
    pub ticker: String,

    pub action: TradeAction,

    /// Number of shares, always positive
    pub quantity: u32,

    /// Price per share in USD
    pub price: Decimal,

    pub timestamp: DateTime<Utc>,

    pub trader_name: String,

    pub trader_avatar: String,

    /// Free-text note from the trader, or a substituted notification message
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    comments: Vec<Comment>,

    #[serde(default)]
    copied: bool,
}

impl Trade {
    /// Create a trade attributed to the default master trader.
    pub fn new(
        id: u64,
        ticker: impl Into<String>,
        action: TradeAction,
        quantity: u32,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            ticker: ticker.into(),
            action,
            quantity,
            price,
            timestamp,
            trader_name: DEFAULT_TRADER_NAME.to_string(),
            trader_avatar: DEFAULT_TRADER_AVATAR.to_string(),
            notes: None,
            comments: Vec::new(),
            copied: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes = Some(note.into());
        self
    }

    /// Whether this trade has been copied to a brokerage.
    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Mark the trade as copied. Re-marking is harmless; there is no way back.
    pub fn mark_copied(&mut self) {
        self.copied = true;
    }

    /// Comments in the order they were posted.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub(crate) fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Total cost of the trade at its quoted price.
    pub fn total_cost(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Cost of copying this trade at a different quantity.
    pub fn cost_for(&self, quantity: u32) -> Decimal {
        self.price * Decimal::from(quantity)
    }

    /// Relative age such as "Just now", "5m ago", "2h ago" or "3d ago".
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.timestamp).num_minutes();
        if minutes < 1 {
            return "Just now".to_string();
        }
        if minutes < 60 {
            return format!("{}m ago", minutes);
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{}h ago", hours);
        }
        format!("{}d ago", hours / 24)
    }
}
