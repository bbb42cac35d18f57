//! Portfolio holdings and their valuation.

use serde::{Deserialize, Serialize};

/// A quantity of one token held by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub token_id: String,
    pub amount: f64,
}

impl Holding {
    pub fn new(token_id: impl Into<String>, amount: f64) -> Self {
        Self {
            token_id: token_id.into(),
            amount,
        }
    }
}

/// One holding priced in USD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub token_id: String,
    pub amount: f64,
    pub price: f64,
    pub value_usd: f64,
    pub change_24h_usd: f64,
    /// False when the price lookup failed and zero was substituted
    pub price_available: bool,
}

/// All holdings priced, with totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValuation>,
    pub total_value_usd: f64,
    pub total_change_24h_usd: f64,
    /// True when at least one holding was valued at the fallback price
    pub is_stale: bool,
}

impl PortfolioValuation {
    pub fn from_holdings(holdings: Vec<HoldingValuation>) -> Self {
        let total_value_usd = holdings.iter().map(|h| h.value_usd).sum();
        let total_change_24h_usd = holdings.iter().map(|h| h.change_24h_usd).sum();
        let is_stale = holdings.iter().any(|h| !h.price_available);

        Self {
            holdings,
            total_value_usd,
            total_change_24h_usd,
            is_stale,
        }
    }

    /// Change over 24h relative to the value 24h ago.
    pub fn change_24h_percent(&self) -> f64 {
        let previous = self.total_value_usd - self.total_change_24h_usd;
        if previous == 0.0 {
            0.0
        } else {
            self.total_change_24h_usd / previous * 100.0
        }
    }
}
