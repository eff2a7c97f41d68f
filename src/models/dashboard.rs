//! Dashboard aggregation wire shapes: summary counts, achievements, streaks.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub ghost_count_total: u64,
    #[serde(rename = "ghostCount30d")]
    pub ghost_count_30d: u64,
    #[serde(default)]
    pub last_ghost_at_epoch_ms: Option<i64>,
    #[serde(default)]
    pub streak_days: Option<u32>,
    #[serde(default, rename = "topHesitationTags30d")]
    pub top_hesitation_tags_30d: Option<Vec<HesitationTag>>,
}

impl DashboardSummary {
    pub fn last_ghost_at(&self) -> Option<DateTime<Utc>> {
        self.last_ghost_at_epoch_ms
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HesitationTag {
    pub tag: String,
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementsResponse {
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreaksResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
}
