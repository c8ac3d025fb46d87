//! Error type for user-initiated portal actions.
//!
//! Every action (login, registration, payout request, ...) fails with a single
//! `PortalError` whose `Display` text is what the user should see: the local
//! validation message, the backend's own message, or the action's fallback.

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum PortalError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend or the network failed the request.
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },

    /// Local credential or cache storage failed.
    #[error("{0}")]
    Storage(String),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::Validation(message.into())
    }

    /// Wrap an API failure, keeping the backend's message or using `fallback`.
    pub fn from_api(source: ApiError, fallback: &str) -> Self {
        PortalError::Api {
            message: source.user_message(fallback),
            source,
        }
    }

    /// Closure form of [`PortalError::from_api`] for `map_err`.
    pub fn api(fallback: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::from_api(source, fallback)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PortalError::Validation(_))
    }

    /// The underlying API error, if the failure came from a request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            PortalError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PortalError {
    fn from(err: anyhow::Error) -> Self {
        PortalError::Storage(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_wins_over_fallback() {
        let api = ApiError::Rejected {
            status: 400,
            message: "Code expired".to_string(),
        };
        let err = PortalError::from_api(api, "Verification failed");
        assert_eq!(err.to_string(), "Code expired");
        assert!(err.api_error().is_some());
    }

    #[test]
    fn test_fallback_used_for_transport_failures() {
        let err = PortalError::from_api(ApiError::Unauthorized, "Login failed. Please check your credentials.");
        assert_eq!(err.to_string(), "Login failed. Please check your credentials.");
    }

    #[test]
    fn test_storage_errors_keep_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("Failed to write credential store");
        let err = PortalError::from(inner);
        assert_eq!(err.to_string(), "Failed to write credential store: disk full");
        assert!(!err.is_validation());
    }
}
