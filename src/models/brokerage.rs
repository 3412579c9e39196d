//! Brokerage venues a copy trade can be routed to.

use serde::{Deserialize, Serialize};

/// An external execution venue the user can connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brokerage {
    /// Stable key (e.g. "robinhood")
    pub id: String,

    /// Display name
    pub name: String,

    /// Display glyph
    pub logo: String,

    #[serde(default)]
    pub connected: bool,
}

impl Brokerage {
    pub fn new(id: &str, name: &str, logo: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            logo: logo.to_string(),
            connected: false,
        }
    }
}

/// The venues seeded on first run, all disconnected.
pub fn default_brokerages() -> Vec<Brokerage> {
    vec![
        Brokerage::new("robinhood", "Robinhood", "🏹"),
        Brokerage::new("webull", "Webull", "🐂"),
        Brokerage::new("fidelity", "Fidelity", "💼"),
        Brokerage::new("schwab", "Charles Schwab", "🏦"),
        Brokerage::new("etrade", "E*TRADE", "📈"),
        Brokerage::new("td", "TD Ameritrade", "🎯"),
        Brokerage::new("interactive", "Interactive Brokers", "🌐"),
    ]
}

/// Quote page for a ticker on a brokerage; unknown brokerages fall back to Google Finance.
pub fn stock_url(brokerage_id: &str, ticker: &str) -> String {
    let t: String = ticker
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    match brokerage_id {
        "robinhood" => format!("https://robinhood.com/stocks/{}", t),
        "webull" => format!("https://www.webull.com/quote/nasdaq-{}", t),
        "fidelity" => format!(
            "https://eresearch.fidelity.com/eresearch/goto/evaluate/snapshot.jhtml?symbols={}",
            t
        ),
        "schwab" => format!("https://www.schwab.com/stock-research/quotes/{}", t),
        "etrade" => format!(
            "https://us.etrade.com/etx/pm/research/stocks/overview?symbol={}",
            t
        ),
        "td" => format!(
            "https://research.tdameritrade.com/grid/public/research/stocks/summary?symbol={}",
            t
        ),
        "interactive" => format!(
            "https://www.interactivebrokers.com/en/trading/products.php?type=stocks&symbol={}",
            t
        ),
        _ => format!("https://www.google.com/finance/quote/{}:NASDAQ", t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_disconnected() {
        let brokerages = default_brokerages();
        assert_eq!(brokerages.len(), 7);
        assert!(brokerages.iter().all(|b| !b.connected));
        assert_eq!(brokerages[3].name, "Charles Schwab");
    }

    #[test]
    fn test_stock_url() {
        assert_eq!(stock_url("robinhood", "aapl"), "https://robinhood.com/stocks/AAPL");
        assert_eq!(
            stock_url("nowhere", "TSLA"),
            "https://www.google.com/finance/quote/TSLA:NASDAQ"
        );
    }
}
