//! Token records built from market-data provider payloads.
//!
//! Every record has a formatting constructor (`from_payload`) and a documented
//! fallback used when the provider cannot be reached.

use crate::error::{MarketDataError, MarketDataResult};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// The record shown when token identity cannot be fetched.
static DEFAULT_TOKEN_INFO: Lazy<TokenInfo> = Lazy::new(|| TokenInfo {
    id: "moonset".to_string(),
    name: "MoonSet".to_string(),
    symbol: "MSET".to_string(),
    description: Some("MoonSet community token.".to_string()),
    image: None,
    homepage: None,
    contract_address: None,
});

/// Data categories, each cached with its own lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    Info,
    Price,
    Metrics,
    Chart,
}

impl DataCategory {
    pub const ALL: [DataCategory; 4] = [
        DataCategory::Info,
        DataCategory::Price,
        DataCategory::Metrics,
        DataCategory::Chart,
    ];

    /// Cache lifetime, matched to how quickly the data goes stale.
    pub fn ttl(&self) -> Duration {
        match self {
            DataCategory::Price => Duration::from_secs(30),
            DataCategory::Metrics => Duration::from_secs(2 * 60),
            DataCategory::Chart => Duration::from_secs(3 * 60),
            DataCategory::Info => Duration::from_secs(5 * 60),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Info => "info",
            DataCategory::Price => "price",
            DataCategory::Metrics => "metrics",
            DataCategory::Chart => "chart",
        }
    }

    pub fn cache_key(&self, token_id: &str) -> String {
        format!("{}:{}", self.as_str(), token_id)
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl TokenInfo {
    /// The static MoonSet record.
    pub fn fallback() -> Self {
        DEFAULT_TOKEN_INFO.clone()
    }

    /// Format a `/coins/{id}` payload. Missing fields fall back to the
    /// requested id or are left empty.
    pub fn from_payload(raw: &Value, token_id: &str) -> Self {
        let id = str_field(raw, "/id").unwrap_or_else(|| token_id.to_string());
        let name = str_field(raw, "/name").unwrap_or_else(|| id.clone());
        let symbol = str_field(raw, "/symbol")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();

        let contract_address = str_field(raw, "/contract_address").or_else(|| {
            raw.get("platforms")
                .and_then(Value::as_object)
                .and_then(|platforms| {
                    platforms
                        .values()
                        .filter_map(Value::as_str)
                        .find(|addr| !addr.is_empty())
                        .map(str::to_string)
                })
        });

        Self {
            id,
            name,
            symbol,
            description: str_field(raw, "/description/en"),
            image: str_field(raw, "/image/large"),
            homepage: str_field(raw, "/links/homepage/0"),
            contract_address,
        }
    }
}

/// Current price and its recent movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceData {
    pub current: f64,
    pub change_24h: f64,
    pub change_24h_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TokenPriceData {
    /// Zero price in USD.
    pub fn fallback() -> Self {
        Self {
            current: 0.0,
            change_24h: 0.0,
            change_24h_percent: 0.0,
            high_24h: None,
            low_24h: None,
            currency: "USD".to_string(),
            last_updated: None,
        }
    }

    /// Format a `/coins/{id}` payload.
    ///
    /// `market_data.current_price.usd` is required; the deltas default to zero.
    pub fn from_payload(raw: &Value) -> MarketDataResult<Self> {
        let current = f64_field(raw, "/market_data/current_price/usd").ok_or_else(|| {
            MarketDataError::MalformedPayload("market_data.current_price.usd".to_string())
        })?;

        Ok(Self {
            current,
            change_24h: f64_field(raw, "/market_data/price_change_24h").unwrap_or(0.0),
            change_24h_percent: f64_field(raw, "/market_data/price_change_percentage_24h")
                .unwrap_or(0.0),
            high_24h: f64_field(raw, "/market_data/high_24h/usd"),
            low_24h: f64_field(raw, "/market_data/low_24h/usd"),
            currency: "USD".to_string(),
            last_updated: str_field(raw, "/market_data/last_updated")
                .or_else(|| str_field(raw, "/last_updated"))
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }
}

/// Market metrics. An absent value means the provider did not report it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_diluted_valuation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circulating_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_time_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_time_low: Option<f64>,
}

impl TokenMetrics {
    /// Every metric absent.
    pub fn fallback() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn from_payload(raw: &Value) -> Self {
        Self {
            market_cap: f64_field(raw, "/market_data/market_cap/usd"),
            fully_diluted_valuation: f64_field(raw, "/market_data/fully_diluted_valuation/usd"),
            volume_24h: f64_field(raw, "/market_data/total_volume/usd"),
            circulating_supply: f64_field(raw, "/market_data/circulating_supply"),
            total_supply: f64_field(raw, "/market_data/total_supply"),
            max_supply: f64_field(raw, "/market_data/max_supply"),
            market_cap_rank: raw
                .pointer("/market_cap_rank")
                .and_then(Value::as_u64)
                .and_then(|rank| u32::try_from(rank).ok()),
            all_time_high: f64_field(raw, "/market_data/ath/usd"),
            all_time_low: f64_field(raw, "/market_data/atl/usd"),
        }
    }
}

/// One sample of the historical price series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Historical price series, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenChartData {
    pub points: Vec<ChartPoint>,
}

impl TokenChartData {
    /// No points.
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Format a `/coins/{id}/market_chart` payload.
    ///
    /// The `prices` array is required; samples that are not a
    /// `[millis, price]` pair are skipped.
    pub fn from_payload(raw: &Value) -> MarketDataResult<Self> {
        let prices = raw
            .get("prices")
            .and_then(Value::as_array)
            .ok_or_else(|| MarketDataError::MalformedPayload("prices".to_string()))?;

        let mut points: Vec<ChartPoint> = prices
            .iter()
            .filter_map(|sample| {
                let pair = sample.as_array()?;
                let millis = pair.first()?.as_f64()? as i64;
                let price = pair.get(1)?.as_f64()?;
                let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)?;
                Some(ChartPoint { timestamp, price })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        Ok(Self { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.last()
    }

    /// Lowest and highest price in the series.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let mut prices = self.points.iter().map(|p| p.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Percentage move from the first to the last sample.
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.points.first()?.price;
        let last = self.points.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Everything the token page shows, merged from the four categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteTokenData {
    pub token: TokenInfo,
    pub price: TokenPriceData,
    pub metrics: TokenMetrics,
    pub chart: TokenChartData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompleteTokenData {
    /// Every field at its fallback, with `error` set.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            token: TokenInfo::fallback(),
            price: TokenPriceData::fallback(),
            metrics: TokenMetrics::fallback(),
            chart: TokenChartData::fallback(),
            error: Some(error.into()),
        }
    }
}

fn str_field(raw: &Value, pointer: &str) -> Option<String> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn f64_field(raw: &Value, pointer: &str) -> Option<f64> {
    raw.pointer(pointer).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coin_payload() -> Value {
        json!({
            "id": "moonset",
            "symbol": "mset",
            "name": "MoonSet",
            "description": {"en": "To the moon."},
            "image": {"large": "https://img.example.com/mset.png"},
            "links": {"homepage": ["https://moonset.example.com", ""]},
            "platforms": {"ethereum": "0xabc"},
            "market_cap_rank": 812,
            "market_data": {
                "current_price": {"usd": 0.0421},
                "price_change_24h": -0.0012,
                "price_change_percentage_24h": -2.77,
                "high_24h": {"usd": 0.045},
                "low_24h": {"usd": 0.041},
                "market_cap": {"usd": 4210000.0},
                "total_volume": {"usd": 125000.0},
                "circulating_supply": 100000000.0,
                "total_supply": 250000000.0,
                "max_supply": null,
                "ath": {"usd": 0.12},
                "atl": {"usd": 0.003},
                "last_updated": "2024-05-01T12:00:00.000Z"
            }
        })
    }

    #[test]
    fn test_category_ttls() {
        assert_eq!(DataCategory::Price.ttl(), Duration::from_secs(30));
        assert_eq!(DataCategory::Metrics.ttl(), Duration::from_secs(120));
        assert_eq!(DataCategory::Chart.ttl(), Duration::from_secs(180));
        assert_eq!(DataCategory::Info.ttl(), Duration::from_secs(300));
        assert_eq!(DataCategory::Price.cache_key("moonset"), "price:moonset");
    }

    #[test]
    fn test_token_info_from_payload() {
        let info = TokenInfo::from_payload(&coin_payload(), "moonset");
        assert_eq!(info.name, "MoonSet");
        assert_eq!(info.symbol, "MSET");
        assert_eq!(info.homepage.as_deref(), Some("https://moonset.example.com"));
        assert_eq!(info.contract_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_token_info_missing_fields() {
        let info = TokenInfo::from_payload(&json!({}), "other-token");
        assert_eq!(info.id, "other-token");
        assert_eq!(info.name, "other-token");
        assert!(info.description.is_none());
    }

    #[test]
    fn test_price_from_payload() {
        let price = TokenPriceData::from_payload(&coin_payload()).unwrap();
        assert_eq!(price.current, 0.0421);
        assert_eq!(price.change_24h_percent, -2.77);
        assert_eq!(price.currency, "USD");
        assert!(price.last_updated.is_some());
    }

    #[test]
    fn test_price_requires_current_price() {
        let result = TokenPriceData::from_payload(&json!({"market_data": {}}));
        assert!(matches!(result, Err(MarketDataError::MalformedPayload(_))));
    }

    #[test]
    fn test_price_fallback_serialization() {
        let value = serde_json::to_value(TokenPriceData::fallback()).unwrap();
        assert_eq!(
            value,
            json!({"current": 0.0, "change24h": 0.0, "change24hPercent": 0.0, "currency": "USD"})
        );
    }

    #[test]
    fn test_metrics_from_payload() {
        let metrics = TokenMetrics::from_payload(&coin_payload());
        assert_eq!(metrics.market_cap, Some(4210000.0));
        assert_eq!(metrics.max_supply, None);
        assert_eq!(metrics.market_cap_rank, Some(812));
        assert!(!metrics.is_empty());
        assert!(TokenMetrics::fallback().is_empty());
    }

    #[test]
    fn test_chart_from_payload() {
        let raw = json!({
            "prices": [
                [1714564800000.0, 0.05],
                [1714478400000.0, 0.04],
                ["garbage"],
                [1714651200000.0, 0.06]
            ]
        });
        let chart = TokenChartData::from_payload(&raw).unwrap();
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.points[0].price, 0.04);
        assert_eq!(chart.latest().map(|p| p.price), Some(0.06));
        assert_eq!(chart.price_range(), Some((0.04, 0.06)));
        let change = chart.change_percent().unwrap();
        assert!((change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_requires_prices() {
        assert!(TokenChartData::from_payload(&json!({"market_caps": []})).is_err());
        assert!(TokenChartData::fallback().is_empty());
    }
}
