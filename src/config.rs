//! Application configuration.

use serde::{Deserialize, Serialize};

/// Timing, capacity and policy settings for a dashboard session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interval between feed ticks (ms)
    pub poll_interval_ms: u64,

    /// Chance (0.0 to 1.0) that a feed tick produces a trade
    pub trade_arrival_probability: f64,

    /// Simulated latency before the initial trades arrive (ms)
    pub initial_load_delay_ms: u64,

    /// How long a notification stays visible (ms)
    pub notification_timeout_ms: u64,

    /// Fade-out time before a hidden notification is removed (ms)
    pub fade_duration_ms: u64,

    /// How long the comment "limit reached" notice stays up (ms)
    pub comment_limit_notice_ms: u64,

    /// Maximum comments per trade
    pub max_comments_per_trade: usize,

    /// Maximum characters per comment after sanitizing
    pub max_comment_length: usize,

    /// Maximum trades kept in the feed
    pub max_trades_displayed: usize,

    /// Author name attached to the viewer's comments
    pub comment_author: String,

    /// Only approve copies routed to a connected brokerage
    pub require_connected_brokerage: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 15_000,
            trade_arrival_probability: 0.3,
            initial_load_delay_ms: 1_000,
            notification_timeout_ms: 5_000,
            fade_duration_ms: 300,
            comment_limit_notice_ms: 3_000,
            max_comments_per_trade: 50,
            max_comment_length: 300,
            max_trades_displayed: 100,
            comment_author: "You".to_string(),
            require_connected_brokerage: false,
        }
    }
}
