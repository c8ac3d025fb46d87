//! Authentication module for managing the partner session and its tokens.
//!
//! This module provides:
//! - `SessionManager`: the session state machine (startup check, login, logout)
//! - `CredentialStore`: the cookie and durable token mirrors
//! - `InactivityMonitor`: the 30-minute idle countdown
//!
//! The stored access token is the only persisted session state; the user is
//! always re-fetched from the backend on startup.

pub mod cookie;
pub mod credentials;
pub mod inactivity;
pub mod session;
pub mod store;

pub use cookie::CookieJar;
pub use credentials::{
    CredentialBackend, CredentialStore, ACCESS_TOKEN_KEY, COOKIE_LIFETIME_DAYS, REFRESH_TOKEN_KEY,
};
pub use inactivity::{InactivityMonitor, INACTIVITY_TIMEOUT};
pub use session::{Notice, NoticeLevel, Route, SessionEvent, SessionManager, SessionState};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
