//! Trade-journal entries ("ghosts") - trades the user considered but did
//! not execute - and the request/response shapes around them.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Wire status of an entry that has not been closed out.
const STATUS_OPEN: &str = "OPEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ghost {
    pub ghost_id: String,
    pub user_id: String,
    pub created_at_epoch_ms: i64,
    pub ticker: String,
    pub direction: String,
    pub intended_price: f64,
    pub intended_size: f64,
    #[serde(default)]
    pub hesitation_tags: Option<Vec<String>>,
    #[serde(default)]
    pub note_text: Option<String>,
    #[serde(default)]
    pub voice_key: Option<String>,
    pub status: String,
    pub logged_quote: QuoteData,
}

impl Ghost {
    /// Creation time; out-of-range timestamps clamp to the epoch.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.created_at_epoch_ms)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }
}

/// Market quote captured at logging time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub price: f64,
    pub provider_ts: String,
    pub captured_at_epoch_ms: i64,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGhostRequest {
    pub ticker: String,
    pub direction: String,
    pub intended_price: f64,
    pub intended_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hesitation_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGhostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostListResponse {
    pub ghosts: Vec<Ghost>,
    /// Paging cursor; present when more entries remain.
    #[serde(default)]
    pub last_evaluated_key: Option<String>,
}

/// A ticker the user keeps considering without executing, aggregated from
/// their logged ghosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostedAsset {
    pub ticker: String,
    /// Number of times the user has ghosted this ticker.
    pub count: usize,
}

impl GhostedAsset {
    /// The first two letters of the ticker, used as avatar initials.
    pub fn initials(&self) -> String {
        self.ticker.chars().take(2).collect::<String>().to_uppercase()
    }
}

/// Aggregate ghosts per ticker, most-ghosted first. Ties break
/// alphabetically so the ordering is stable across fetches.
pub fn ghosted_assets(ghosts: &[Ghost]) -> Vec<GhostedAsset> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for ghost in ghosts {
        *counts.entry(ghost.ticker.as_str()).or_default() += 1;
    }
    let mut assets: Vec<GhostedAsset> = counts
        .into_iter()
        .map(|(ticker, count)| GhostedAsset {
            ticker: ticker.to_string(),
            count,
        })
        .collect();
    assets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.ticker.cmp(&b.ticker)));
    assets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ghost(ticker: &str) -> Ghost {
        serde_json::from_value(serde_json::json!({
            "ghostId": "g-1",
            "userId": "user-123",
            "createdAtEpochMs": 1_738_800_000_000_i64,
            "ticker": ticker,
            "direction": "LONG",
            "intendedPrice": 187.5,
            "intendedSize": 10.0,
            "status": "OPEN",
            "loggedQuote": {
                "price": 188.2,
                "providerTs": "2026-02-06T00:00:00Z",
                "capturedAtEpochMs": 1_738_800_000_123_i64,
                "source": "alpaca"
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_wire_shape_with_optional_fields_absent() {
        let ghost = sample_ghost("AAPL");
        assert_eq!(ghost.ghost_id, "g-1");
        assert!(ghost.is_open());
        assert!(ghost.hesitation_tags.is_none());
        assert_eq!(ghost.created_at().timestamp_millis(), 1_738_800_000_000);
    }

    #[test]
    fn create_request_omits_absent_optionals() {
        let request = CreateGhostRequest {
            ticker: "AAPL".to_string(),
            direction: "LONG".to_string(),
            intended_price: 187.5,
            intended_size: 10.0,
            hesitation_tags: None,
            note_text: None,
            voice_key: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("noteText").is_none());
        assert_eq!(value["intendedPrice"], 187.5);
    }

    #[test]
    fn ghosted_assets_orders_by_count_then_ticker() {
        let ghosts = vec![
            sample_ghost("TSLA"),
            sample_ghost("AAPL"),
            sample_ghost("TSLA"),
            sample_ghost("NVDA"),
            sample_ghost("AAPL"),
            sample_ghost("TSLA"),
        ];
        let assets = ghosted_assets(&ghosts);
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].ticker, "TSLA");
        assert_eq!(assets[0].count, 3);
        assert_eq!(assets[1].ticker, "AAPL");
        assert_eq!(assets[2].ticker, "NVDA");
        assert_eq!(assets[2].count, 1);
    }

    #[test]
    fn initials_are_first_two_letters_uppercased() {
        let asset = GhostedAsset { ticker: "msft".to_string(), count: 1 };
        assert_eq!(asset.initials(), "MS");
    }
}
