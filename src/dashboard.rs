//! Dashboard: the trade feed, copy workflow, comments and notifications wired together.
//!
//! Handles:
//! - Loading the initial trades and ticking the simulated feed
//! - Staging, approving and rejecting copy trades
//! - Executing approved copies against the (simulated) brokerage
//! - Posting comments within the per-trade limit
//! - Expiring notifications on the virtual clock
//!
//! All state changes happen on discrete calls: a user command or
//! [`Dashboard::advance`] firing due timers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::comments::{post_comment, CommentError};
use crate::config::AppConfig;
use crate::feed::TradeFeed;
use crate::ids::IdGenerator;
use crate::models::{Comment, CopyExecution, Trade};
use crate::notifications::{NotificationCenter, SoundEffects, SoundPlayer};
use crate::scheduler::{Scheduler, Task};
use crate::store::PreferenceStore;
use crate::trading::{ApprovalError, BrokerageRegistry, CopyEngine, CopyOrder, PendingCopyTrade};

/// Why a copy could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyError {
    #[error("Trade {0} not found")]
    TradeNotFound(u64),

    #[error("Trade {0} has already been copied")]
    AlreadyCopied(u64),
}

/// Something that happened while advancing the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    TradesLoaded(usize),
    TradeArrived { trade_id: u64, notification_id: u64 },
    NotificationHidden(u64),
    NotificationRemoved(u64),
    CommentLimitCleared(u64),
}

/// The viewer's dashboard state.
pub struct Dashboard {
    config: AppConfig,
    scheduler: Scheduler,
    feed: TradeFeed,
    trades: Vec<Trade>,
    loaded: bool,
    engine: CopyEngine,
    registry: BrokerageRegistry,
    notifications: NotificationCenter,
    executions: Vec<CopyExecution>,
    trade_ids: IdGenerator,
    comment_ids: IdGenerator,
    /// Trade id to the time its limit notice expires.
    comment_limit_notices: HashMap<u64, u64>,
}

impl Dashboard {
    /// Build a dashboard over `store`. Call [`Dashboard::start`] to begin loading trades.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PreferenceStore>,
        player: Box<dyn SoundPlayer>,
        feed: TradeFeed,
    ) -> Self {
        let sound = SoundEffects::new(store.clone(), player);
        let notifications =
            NotificationCenter::new(sound, config.notification_timeout_ms, config.fade_duration_ms);

        Self {
            engine: CopyEngine::new(store.clone(), config.require_connected_brokerage),
            registry: BrokerageRegistry::load(store),
            notifications,
            config,
            scheduler: Scheduler::new(),
            feed,
            trades: Vec::new(),
            loaded: false,
            executions: Vec::new(),
            trade_ids: IdGenerator::new(),
            comment_ids: IdGenerator::new(),
            comment_limit_notices: HashMap::new(),
        }
    }

    /// Schedule the initial trade load.
    pub fn start(&mut self) {
        info!(delay_ms = self.config.initial_load_delay_ms, "Loading trades");
        self.scheduler
            .schedule(self.config.initial_load_delay_ms, Task::LoadInitialTrades);
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// When the next timer is due, if any.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Move the clock to `until_ms`, firing every timer due on the way.
    pub fn advance(&mut self, until_ms: u64) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        while let Some(task) = self.scheduler.pop_due(until_ms) {
            if let Some(event) = self.handle(task) {
                events.push(event);
            }
        }
        events
    }

    /// Feed cadence; a zero interval would reschedule the tick forever at the same instant.
    fn poll_interval_ms(&self) -> u64 {
        self.config.poll_interval_ms.max(1)
    }

    fn handle(&mut self, task: Task) -> Option<DashboardEvent> {
        match task {
            Task::LoadInitialTrades => {
                if self.loaded {
                    return None;
                }
                self.trades = TradeFeed::initial_trades(Utc::now());
                self.loaded = true;
                self.scheduler.schedule(self.poll_interval_ms(), Task::FeedTick);
                info!(count = self.trades.len(), "Initial trades loaded");
                Some(DashboardEvent::TradesLoaded(self.trades.len()))
            }
            Task::FeedTick => {
                self.scheduler.schedule(self.poll_interval_ms(), Task::FeedTick);
                let id = self.trade_ids.next();
                let trade = self.feed.tick(id, Utc::now())?;
                Some(self.receive_trade(trade))
            }
            Task::HideNotification(id) => self
                .notifications
                .hide(&mut self.scheduler, id)
                .then_some(DashboardEvent::NotificationHidden(id)),
            Task::RemoveNotification(id) => self
                .notifications
                .remove(id)
                .then_some(DashboardEvent::NotificationRemoved(id)),
            Task::ClearCommentLimitNotice(trade_id) => {
                // A later hit pushes the expiry out; its own timer clears it.
                let expires_ms = *self.comment_limit_notices.get(&trade_id)?;
                if expires_ms > self.scheduler.now_ms() {
                    return None;
                }
                self.comment_limit_notices.remove(&trade_id);
                Some(DashboardEvent::CommentLimitCleared(trade_id))
            }
        }
    }

    /// Add a trade to the top of the feed and announce it.
    pub fn receive_trade(&mut self, trade: Trade) -> DashboardEvent {
        info!(
            trade_id = trade.id,
            ticker = %trade.ticker,
            action = %trade.action,
            quantity = trade.quantity,
            price = %trade.price,
            "New trade from master trader"
        );

        let notification_id = self.notifications.add(&mut self.scheduler, &trade, None);
        let trade_id = trade.id;
        self.trades.insert(0, trade);
        self.trades.truncate(self.config.max_trades_displayed);

        DashboardEvent::TradeArrived {
            trade_id,
            notification_id,
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    /// Trades, newest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade(&self, id: u64) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    // ==================== Copy Trading ====================

    /// Stage a copy of a trade, routed to the usable default brokerage if there is one.
    pub fn copy_trade(&mut self, trade_id: u64) -> Result<&PendingCopyTrade, CopyError> {
        let trade = self
            .trades
            .iter()
            .find(|t| t.id == trade_id)
            .ok_or(CopyError::TradeNotFound(trade_id))?;
        if trade.is_copied() {
            return Err(CopyError::AlreadyCopied(trade_id));
        }

        let default_brokerage = self.registry.usable_default();
        Ok(self.engine.initiate(trade, default_brokerage))
    }

    pub fn engine(&self) -> &CopyEngine {
        &self.engine
    }

    /// Quantity preferences and the staged trade's quantity/brokerage are edited here.
    pub fn engine_mut(&mut self) -> &mut CopyEngine {
        &mut self.engine
    }

    /// Approve the staged copy and execute it.
    pub fn approve(&mut self) -> Result<CopyExecution, ApprovalError> {
        let order = self.engine.approve(&self.registry)?;
        Ok(self.execute(order))
    }

    pub fn reject(&mut self) -> Option<PendingCopyTrade> {
        self.engine.reject()
    }

    /// Simulated execution: no brokerage is contacted.
    fn execute(&mut self, order: CopyOrder) -> CopyExecution {
        let brokerage = self.registry.display_name(&order.brokerage_id).to_string();
        let execution = CopyExecution::new(&order.trade, order.quantity, brokerage);

        match self.trades.iter_mut().find(|t| t.id == order.trade.id) {
            Some(trade) => trade.mark_copied(),
            None => warn!(trade_id = order.trade.id, "Copied trade is no longer in the feed"),
        }

        info!(
            execution_id = %execution.id,
            trade_id = order.trade.id,
            ticker = %execution.ticker,
            quantity = execution.quantity,
            brokerage = %execution.brokerage,
            "[SIMULATED] Copy trade executed"
        );

        self.notifications.add(
            &mut self.scheduler,
            &order.trade,
            Some(execution.confirmation()),
        );
        self.executions.insert(0, execution.clone());
        execution
    }

    /// Executed copies, newest first.
    pub fn executions(&self) -> &[CopyExecution] {
        &self.executions
    }

    // ==================== Brokerages ====================

    pub fn registry(&self) -> &BrokerageRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BrokerageRegistry {
        &mut self.registry
    }

    // ==================== Comments ====================

    /// Post a comment as the configured author.
    ///
    /// At the per-trade limit the comment is refused, a "limit reached"
    /// notification is raised and the trade shows a limit notice for a while.
    pub fn add_comment(&mut self, trade_id: u64, raw: &str) -> Result<Comment, CommentError> {
        let comment_id = self.comment_ids.next();
        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == trade_id)
            .ok_or(CommentError::UnknownTrade(trade_id))?;

        let result = post_comment(
            trade,
            comment_id,
            &self.config.comment_author,
            raw,
            self.config.max_comments_per_trade,
            self.config.max_comment_length,
        );

        match &result {
            Ok(comment) => {
                debug!(trade_id = trade_id, comment_id = comment.id, "Comment added");
            }
            Err(e @ CommentError::LimitReached { .. }) => {
                let snapshot = trade.clone();
                self.notifications
                    .add(&mut self.scheduler, &snapshot, Some(e.to_string()));
                let notice_ms = self.config.comment_limit_notice_ms;
                self.comment_limit_notices
                    .insert(trade_id, self.scheduler.now_ms().saturating_add(notice_ms));
                self.scheduler
                    .schedule(notice_ms, Task::ClearCommentLimitNotice(trade_id));
                info!(trade_id = trade_id, "Comment limit reached");
            }
            Err(_) => {}
        }
        result
    }

    /// Whether the trade is currently showing the "limit reached" notice.
    pub fn comment_limit_notice(&self, trade_id: u64) -> bool {
        self.comment_limit_notices.contains_key(&trade_id)
    }

    // ==================== Notifications ====================

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(&mut self.scheduler, id)
    }

    /// Flip the notification sound preference; returns the new state.
    pub fn toggle_sound(&mut self) -> bool {
        self.notifications.sound_mut().toggle()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            trades: self.trades.len(),
            copied_trades: self.trades.iter().filter(|t| t.is_copied()).count(),
            executions: self.executions.len(),
            connected_brokerages: self.registry.connected_count(),
            total_brokerages: self.registry.list().len(),
            pending_copy: self.engine.is_pending(),
            active_notifications: self.notifications.active().len(),
            sound_enabled: self.notifications.sound().is_enabled(),
        }
    }
}

/// Dashboard statistics.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub trades: usize,
    pub copied_trades: usize,
    pub executions: usize,
    pub connected_brokerages: usize,
    pub total_brokerages: usize,
    pub pending_copy: bool,
    pub active_notifications: usize,
    pub sound_enabled: bool,
}

impl std::fmt::Display for DashboardStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dashboard ===")?;
        writeln!(f, "Trades:          {} ({} copied)", self.trades, self.copied_trades)?;
        writeln!(f, "Copy Executions: {}", self.executions)?;
        writeln!(
            f,
            "Brokerages:      {}/{} connected",
            self.connected_brokerages, self.total_brokerages
        )?;
        writeln!(
            f,
            "Pending Copy:    {}",
            if self.pending_copy { "Awaiting approval" } else { "None" }
        )?;
        writeln!(f, "Notifications:   {}", self.active_notifications)?;
        writeln!(f, "Sound:           {}", if self.sound_enabled { "On" } else { "Off" })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::testing::CountingPlayer;
    use crate::store::MemoryStore;
    use crate::trading::QuantityMode;

    fn dashboard(config: AppConfig) -> (Dashboard, CountingPlayer) {
        let player = CountingPlayer::default();
        let mut d = Dashboard::new(
            config,
            Arc::new(MemoryStore::new()),
            Box::new(player.clone()),
            TradeFeed::seeded(3, 1.0),
        );
        d.start();
        (d, player)
    }

    #[test]
    fn test_initial_load_after_delay() {
        let (mut d, _) = dashboard(AppConfig::default());
        assert!(d.is_loading());
        assert!(d.advance(999).is_empty());

        assert_eq!(d.advance(1_000), vec![DashboardEvent::TradesLoaded(5)]);
        assert!(!d.is_loading());
        assert_eq!(d.next_due_ms(), Some(16_000));
    }

    #[test]
    fn test_feed_tick_prepends_and_notifies() {
        let (mut d, player) = dashboard(AppConfig::default());
        d.advance(1_000);

        let events = d.advance(16_000);
        let arrived = events.iter().find_map(|e| match e {
            DashboardEvent::TradeArrived { trade_id, .. } => Some(*trade_id),
            _ => None,
        });
        let trade_id = arrived.expect("arrival probability is 1.0");

        assert_eq!(d.trades().len(), 6);
        assert_eq!(d.trades()[0].id, trade_id);
        assert_eq!(d.notifications().active().len(), 1);
        assert_eq!(player.count(), 1);
    }

    #[test]
    fn test_feed_is_capped() {
        let config = AppConfig {
            max_trades_displayed: 6,
            ..Default::default()
        };
        let (mut d, _) = dashboard(config);
        d.advance(1_000 + 15_000 * 4);
        assert_eq!(d.trades().len(), 6);
    }

    #[test]
    fn test_zero_poll_interval_still_advances() {
        let config = AppConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let (mut d, _) = dashboard(config);
        d.advance(1_000);

        d.advance(1_050);
        assert_eq!(d.now_ms(), 1_050);
        assert_eq!(d.trades().len(), 55);
        assert_eq!(d.next_due_ms(), Some(1_051));
    }

    #[test]
    fn test_copy_execution_marks_trade() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        d.registry_mut().toggle_connection("robinhood");
        d.registry_mut().set_default_brokerage("robinhood");

        let pending = d.copy_trade(2).unwrap();
        assert_eq!(pending.selected_brokerage, "robinhood");
        assert_eq!(pending.quantity, 50);

        let exec = d.approve().unwrap();
        assert_eq!(exec.brokerage, "Robinhood");
        assert!(d.trade(2).unwrap().is_copied());
        assert_eq!(d.copy_trade(2).unwrap_err(), CopyError::AlreadyCopied(2));
        assert_eq!(d.executions().len(), 1);
    }

    #[test]
    fn test_unknown_brokerage_uses_fallback_name() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        d.copy_trade(3).unwrap();
        d.engine_mut().select_brokerage("mystery");

        let exec = d.approve().unwrap();
        assert_eq!(exec.brokerage, "Unknown");
    }

    #[test]
    fn test_stale_default_starts_empty() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        d.registry_mut().set_default_brokerage("webull");

        assert_eq!(d.copy_trade(1).unwrap().selected_brokerage, "");
        assert_eq!(d.approve(), Err(ApprovalError::NoBrokerageSelected));
        assert!(d.engine().is_pending());
        assert!(!d.trade(1).unwrap().is_copied());
    }

    #[test]
    fn test_reject_leaves_trade_alone() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        d.engine_mut().set_quantity_mode(QuantityMode::Custom);
        d.copy_trade(1).unwrap();

        assert!(d.reject().is_some());
        assert!(!d.engine().is_pending());
        assert!(!d.trade(1).unwrap().is_copied());
        assert!(d.notifications().active().is_empty());
    }

    #[test]
    fn test_comment_limit_notice_expires() {
        let config = AppConfig {
            max_comments_per_trade: 2,
            ..Default::default()
        };
        let (mut d, _) = dashboard(config);
        d.advance(1_000);

        d.add_comment(1, "first").unwrap();
        d.add_comment(1, "second").unwrap();
        assert_eq!(
            d.add_comment(1, "third"),
            Err(CommentError::LimitReached { max: 2 })
        );
        assert!(d.comment_limit_notice(1));
        assert_eq!(d.notifications().active().len(), 1);

        let events = d.advance(4_000);
        assert!(events.contains(&DashboardEvent::CommentLimitCleared(1)));
        assert!(!d.comment_limit_notice(1));
    }

    #[test]
    fn test_repeated_limit_hit_extends_notice() {
        let config = AppConfig {
            max_comments_per_trade: 1,
            ..Default::default()
        };
        let (mut d, _) = dashboard(config);
        d.advance(1_000);

        d.add_comment(1, "only one").unwrap();
        assert!(d.add_comment(1, "again").is_err());

        d.advance(3_000);
        assert!(d.add_comment(1, "and again").is_err());

        // The first hit's timer fires at 4000 and must leave the newer notice alone.
        let events = d.advance(4_500);
        assert!(!events.contains(&DashboardEvent::CommentLimitCleared(1)));
        assert!(d.comment_limit_notice(1));

        d.advance(5_999);
        assert!(d.comment_limit_notice(1));

        let events = d.advance(6_000);
        assert!(events.contains(&DashboardEvent::CommentLimitCleared(1)));
        assert!(!d.comment_limit_notice(1));
    }

    #[test]
    fn test_comment_on_unknown_trade() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        assert_eq!(d.add_comment(77, "hi"), Err(CommentError::UnknownTrade(77)));
    }

    #[test]
    fn test_stats() {
        let (mut d, _) = dashboard(AppConfig::default());
        d.advance(1_000);
        d.copy_trade(1).unwrap();

        let stats = d.stats();
        assert_eq!(stats.trades, 5);
        assert!(stats.pending_copy);
        assert!(stats.to_string().contains("Awaiting approval"));
    }
}
