//! Data models for Phantom entities.
//!
//! This module contains the wire shapes exchanged with the backend:
//!
//! - `Ghost`, `QuoteData`, `GhostedAsset`: trade-journal entries
//! - `UserProfile`: account profile and settings
//! - `DashboardSummary`, `Achievement`, `StreaksResponse`: aggregations
//! - Market types: `MarketQuoteResponse`, `Candle`, etc.

pub mod dashboard;
pub mod ghost;
pub mod market;
pub mod user;

pub use dashboard::{
    Achievement, AchievementsResponse, DashboardSummary, HesitationTag, StreaksResponse,
};
pub use ghost::{
    ghosted_assets, CreateGhostRequest, Ghost, GhostListResponse, GhostedAsset, QuoteData,
    UpdateGhostRequest,
};
pub use market::{Candle, MarketCandlesResponse, MarketQuoteResponse, TickerValidationResponse};
pub use user::{UpdateUserRequest, UserProfile};
