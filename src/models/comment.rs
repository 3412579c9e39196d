//! Comment posted by a viewer on a trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single, immutable comment. Text is already sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub trade_id: u64,
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
