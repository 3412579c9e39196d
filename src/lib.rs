//! TickerTribe copy-trading engine.
//!
//! Follows a (simulated) master trader, lets the viewer comment on trades,
//! and copies trades to a simulated brokerage after an approval step.

pub mod comments;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod feed;
pub mod ids;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod store;
pub mod trading;
pub mod validation;

pub use config::AppConfig;
pub use dashboard::{CopyError, Dashboard, DashboardEvent, DashboardStats};
