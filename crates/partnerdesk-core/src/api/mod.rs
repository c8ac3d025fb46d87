//! REST API client module for the partner portal backend.
//!
//! This module provides the `PortalBackend` trait and its HTTP
//! implementation, `ApiClient`.
//!
//! The API uses bearer token authentication. Tokens come from `/auth/login`
//! and are read back from the credential store on every request.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::PortalBackend;
pub use client::ApiClient;
pub use error::ApiError;
