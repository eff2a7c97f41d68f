//! Phantom core - the client library behind the Phantom trade journal.
//!
//! Phantom logs "ghosts": trades the user considered but did not execute.
//! This crate is the headless core the app shells embed. It owns the
//! authentication session lifecycle (token acquisition, secure persistence,
//! transparent refresh) and the authenticated API pipeline against the
//! Phantom backend, plus the wire models those calls exchange.
//!
//! The composition root builds the pieces explicitly and passes them down;
//! nothing in here is a global:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use phantom_core::api::ApiClient;
//! use phantom_core::auth::{IdentityProvider, KeyringStore, SessionController};
//! use phantom_core::config::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let provider = IdentityProvider::new(&config)?;
//! let session = SessionController::new(provider, Arc::new(KeyringStore::new()));
//! let api = ApiClient::new(&config, session.clone())?;
//!
//! // Screens observe session.subscribe() to pick what to show and call
//! // api.* for data; a failed refresh signs the session out for them.
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthState, SessionController};
pub use config::Config;
