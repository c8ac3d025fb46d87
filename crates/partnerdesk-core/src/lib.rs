//! partnerdesk core - session lifecycle, API client, models and dashboard
//! for the Betaday partner portal.
//!
//! Front ends build an `ApiClient` over a `CredentialStore`, hand it to a
//! `SessionManager`, and drive everything else through the session.

pub mod account;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, PortalBackend};
pub use auth::{CredentialStore, SessionEvent, SessionManager, SessionState};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::PortalError;
