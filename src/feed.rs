//! Simulated master-trader feed.
//!
//! Starts from a fixed batch of recent trades, then each tick has a fixed
//! chance of producing one random trade.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{Trade, TradeAction};

pub const MOCK_TICKERS: [&str; 10] = [
    "AAPL", "TSLA", "NVDA", "MSFT", "GOOGL", "AMZN", "META", "SPY", "QQQ", "AMD",
];

pub const MOCK_NOTES: [&str; 10] = [
    "Strong technical breakout",
    "Taking profits at resistance",
    "Buying the dip",
    "Great entry point",
    "Momentum building",
    "Rebalancing portfolio",
    "Support level holding",
    "Breakout confirmed",
    "Overbought, taking profits",
    "Value play here",
];

/// Random trade source.
#[derive(Debug)]
pub struct TradeFeed {
    rng: StdRng,
    arrival_probability: f64,
}

impl TradeFeed {
    pub fn new(arrival_probability: f64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), arrival_probability)
    }

    /// Deterministic feed for tests and replays.
    pub fn seeded(seed: u64, arrival_probability: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), arrival_probability)
    }

    /// Probabilities are clamped to [0, 1]; NaN means no arrivals.
    fn with_rng(rng: StdRng, arrival_probability: f64) -> Self {
        let arrival_probability = if arrival_probability.is_nan() {
            0.0
        } else {
            arrival_probability.clamp(0.0, 1.0)
        };
        Self {
            rng,
            arrival_probability,
        }
    }

    /// The batch shown when the feed first loads, newest first.
    pub fn initial_trades(now: DateTime<Utc>) -> Vec<Trade> {
        let ago = |minutes: i64| now - Duration::minutes(minutes);
        vec![
            Trade::new(1, "AAPL", TradeAction::Buy, 100, dec!(178.50), ago(5))
                .with_note("Strong technical breakout, buying the dip"),
            Trade::new(2, "TSLA", TradeAction::Sell, 50, dec!(242.84), ago(45))
                .with_note("Taking profits at resistance level"),
            Trade::new(3, "NVDA", TradeAction::Buy, 75, dec!(505.25), ago(120))
                .with_note("AI sector looks bullish"),
            Trade::new(4, "SPY", TradeAction::Buy, 200, dec!(445.75), ago(180)),
            Trade::new(5, "MSFT", TradeAction::Sell, 80, dec!(380.50), ago(240))
                .with_note("Rebalancing portfolio"),
        ]
    }

    /// One feed interval: maybe produce a trade with the given id.
    pub fn tick(&mut self, id: u64, now: DateTime<Utc>) -> Option<Trade> {
        if self.rng.random_bool(self.arrival_probability) {
            Some(self.random_trade(id, now))
        } else {
            None
        }
    }

    /// A random trade: quantity 10..=209, price 50.00..549.99, a note half of the time.
    pub fn random_trade(&mut self, id: u64, now: DateTime<Utc>) -> Trade {
        let ticker = MOCK_TICKERS[self.rng.random_range(0..MOCK_TICKERS.len())];
        let action = if self.rng.random_bool(0.5) {
            TradeAction::Buy
        } else {
            TradeAction::Sell
        };
        let quantity = self.rng.random_range(10..210u32);
        let price = Decimal::new(self.rng.random_range(5_000..55_000i64), 2);

        let trade = Trade::new(id, ticker, action, quantity, price, now);
        if self.rng.random_bool(0.5) {
            let note = MOCK_NOTES[self.rng.random_range(0..MOCK_NOTES.len())];
            trade.with_note(note)
        } else {
            trade
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_batch() {
        let now = Utc::now();
        let trades = TradeFeed::initial_trades(now);

        assert_eq!(trades.len(), 5);
        assert_eq!(trades[0].ticker, "AAPL");
        assert_eq!(trades[0].quantity, 100);
        assert_eq!(trades[0].price, dec!(178.50));
        assert!(trades[3].notes.is_none());
        assert!(trades.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert!(trades.iter().all(|t| !t.is_copied()));
    }

    #[test]
    fn test_random_trade_ranges() {
        let mut feed = TradeFeed::seeded(7, 1.0);
        for id in 0..500 {
            let t = feed.random_trade(id, Utc::now());
            assert!((10..210).contains(&t.quantity));
            assert!(t.price >= dec!(50) && t.price < dec!(550));
            assert_eq!(t.price.scale(), 2);
            assert!(MOCK_TICKERS.contains(&t.ticker.as_str()));
        }
    }

    #[test]
    fn test_probability_bounds() {
        let now = Utc::now();
        let mut never = TradeFeed::seeded(1, 0.0);
        let mut always = TradeFeed::seeded(1, 1.0);

        assert!((0..100).all(|i| never.tick(i, now).is_none()));
        assert!((0..100).all(|i| always.tick(i, now).is_some()));
    }

    #[test]
    fn test_out_of_range_probability() {
        let now = Utc::now();
        let mut nan = TradeFeed::seeded(1, f64::NAN);
        let mut high = TradeFeed::seeded(1, 7.5);
        let mut low = TradeFeed::seeded(1, f64::NEG_INFINITY);

        assert!((0..100).all(|i| nan.tick(i, now).is_none()));
        assert!((0..100).all(|i| high.tick(i, now).is_some()));
        assert!((0..100).all(|i| low.tick(i, now).is_none()));
    }

    #[test]
    fn test_seeded_feed_is_deterministic() {
        let now = Utc::now();
        let mut a = TradeFeed::seeded(42, 0.3);
        let mut b = TradeFeed::seeded(42, 0.3);

        for i in 0..50 {
            assert_eq!(a.tick(i, now), b.tick(i, now));
        }
    }
}
