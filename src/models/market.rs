//! Market-data lookup wire shapes.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TickerValidationResponse {
    pub valid: bool,
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuoteResponse {
    pub symbol: String,
    pub price: f64,
    pub provider_ts: String,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCandlesResponse {
    pub symbol: String,
    pub interval: String,
    #[serde(default)]
    pub candles: Vec<Candle>,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candle {
    pub datetime: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
