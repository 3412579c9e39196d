//! Data models for trades, comments, brokerages, notifications and executions.

mod brokerage;
mod comment;
mod execution;
mod notification;
mod trade;

pub use brokerage::{default_brokerages, stock_url, Brokerage};
pub use comment::Comment;
pub use execution::CopyExecution;
pub use notification::Notification;
pub use trade::{Trade, TradeAction, DEFAULT_TRADER_AVATAR, DEFAULT_TRADER_NAME};
