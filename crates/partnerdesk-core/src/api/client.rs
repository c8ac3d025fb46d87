//! API client for communicating with the partner portal REST API.
//!
//! This module provides the `ApiClient` struct. Every outbound request goes
//! through `ApiClient::request`, which resolves the path against the base URL
//! and attaches the current bearer token from the credential store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::models::{
    Acknowledgement, Commission, CommissionSettings, CustomerOnboarding, EmailRequest,
    GenerateCodeRequest, InstallerRegistration, LoginRequest, LoginResponse, PayoutRequest,
    Pricing, ProfileUpdate, ReferralCode, ResetPasswordRequest, TrainingResource, User,
    VerifyEmailRequest,
};
use crate::models::referral::CommissionsResponse;
use crate::models::user::ProfileResponse;

use super::{ApiError, PortalBackend};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the partner portal backend.
/// Clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    /// Create a new API client. `base_url` is fixed for the client's lifetime.
    pub fn new(base_url: &str, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Bearer header for the token currently in the credential store, if any.
    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.credentials.access_token() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(e) => warn!(error = %e, "Stored token is not a valid header value"),
            }
        }
        headers
    }

    /// Start a request to `path`. The token is read at this point, so a login
    /// or logout between two requests is always reflected.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json")
            .headers(self.auth_headers())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let url = response.url().to_string();
        let response = Self::check_response(response).await?;
        let body = response.text().await?;
        debug!(url = %url, bytes = body.len(), "Response received");
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn send_ack(&self, builder: RequestBuilder) -> Result<Acknowledgement, ApiError> {
        let body = self.send(builder).await?;
        Ok(Acknowledgement::from_body(&body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Acknowledgement, ApiError> {
        self.send_ack(self.request(Method::POST, path).json(body)).await
    }
}

#[async_trait]
impl PortalBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!(email = %request.email, "Sending login request");
        self.send_json(self.request(Method::POST, "/auth/login").json(request))
            .await
    }

    async fn register_installer(
        &self,
        registration: &InstallerRegistration,
    ) -> Result<Acknowledgement, ApiError> {
        self.post("/auth/installer/register", registration).await
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<Acknowledgement, ApiError> {
        self.post("/auth/verify-email", request).await
    }

    async fn resend_otp(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        self.post("/auth/resend-otp", &EmailRequest { email: email.to_string() })
            .await
    }

    async fn fetch_profile(&self) -> Result<User, ApiError> {
        let profile: ProfileResponse = self.get("/auth/profile").await?;
        Ok(profile.into_user())
    }

    async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        self.post("/auth/password-reset/request", &EmailRequest { email: email.to_string() })
            .await
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Acknowledgement, ApiError> {
        self.post("/auth/password-reset/reset", request).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Acknowledgement, ApiError> {
        self.send_ack(self.request(Method::PUT, "/profile").json(update))
            .await
    }

    async fn fetch_referral_codes(&self) -> Result<Vec<ReferralCode>, ApiError> {
        self.get("/referrals/codes").await
    }

    async fn generate_referral_code(&self, code: Option<&str>) -> Result<Acknowledgement, ApiError> {
        let body = GenerateCodeRequest {
            code: code.map(str::to_string),
        };
        self.post("/referrals/codes", &body).await
    }

    async fn fetch_commissions(&self) -> Result<Vec<Commission>, ApiError> {
        let response: CommissionsResponse = self.get("/referrals/commissions").await?;
        Ok(response.into_vec())
    }

    async fn fetch_training_resources(&self) -> Result<Vec<TrainingResource>, ApiError> {
        self.get("/referrals/training-resources").await
    }

    async fn fetch_payout_requests(&self) -> Result<Vec<PayoutRequest>, ApiError> {
        self.get("/referrals/payouts").await
    }

    async fn request_payout(&self) -> Result<Acknowledgement, ApiError> {
        self.send_ack(self.request(Method::POST, "/referrals/payouts"))
            .await
    }

    async fn fetch_commission_settings(&self) -> Result<CommissionSettings, ApiError> {
        self.get("/referrals/settings").await
    }

    async fn fetch_pricing(&self) -> Result<Pricing, ApiError> {
        self.get("/pricing").await
    }

    async fn register_customer(&self, onboarding: &CustomerOnboarding) -> Result<Acknowledgement, ApiError> {
        self.post("/onboarding/register", onboarding).await
    }
}
