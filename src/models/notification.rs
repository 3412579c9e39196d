//! Transient banners raised for trade events.

use serde::{Deserialize, Serialize};

use super::Trade;

/// A banner tied to a trade event. `visible` drives the fade-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub trade: Trade,
    pub visible: bool,
}

impl Notification {
    /// Text shown in the banner: the override message or the trade's note.
    pub fn message(&self) -> Option<&str> {
        self.trade.notes.as_deref()
    }

    /// One-line summary for terminal output.
    pub fn headline(&self) -> String {
        format!(
            "{} {} {} {} @ ${}",
            self.trade.trader_name,
            self.trade.action,
            self.trade.quantity,
            self.trade.ticker,
            self.trade.price
        )
    }
}
