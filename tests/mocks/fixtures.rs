use serde_json::{json, Value};

/// A `/coins/{id}` payload with every field the formatters read.
pub fn coin_payload(price: f64) -> Value {
    json!({
        "id": "moonset",
        "symbol": "mset",
        "name": "MoonSet",
        "description": {"en": "To the moon."},
        "image": {"large": "https://img.example.com/mset.png"},
        "links": {"homepage": ["https://moonset.example.com"]},
        "platforms": {"ethereum": "0x1234567890abcdef1234567890abcdef12345678"},
        "market_cap_rank": 812,
        "market_data": {
            "current_price": {"usd": price},
            "price_change_24h": 0.002,
            "price_change_percentage_24h": 5.0,
            "high_24h": {"usd": price * 1.1},
            "low_24h": {"usd": price * 0.9},
            "market_cap": {"usd": 4_210_000.0},
            "total_volume": {"usd": 125_000.0},
            "circulating_supply": 100_000_000.0,
            "total_supply": 250_000_000.0,
            "ath": {"usd": 0.12},
            "atl": {"usd": 0.003},
            "last_updated": "2024-05-01T12:00:00.000Z"
        }
    })
}

/// A `/coins/{id}/market_chart` payload with samples at the given prices,
/// one hour apart.
pub fn chart_payload(prices: &[f64]) -> Value {
    let start = 1_714_521_600_000_i64;
    let samples: Vec<Value> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| json!([start + i as i64 * 3_600_000, p]))
        .collect();
    json!({ "prices": samples })
}
