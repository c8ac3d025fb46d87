//! In-process `PortalBackend` for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use crate::api::{ApiError, PortalBackend};
use crate::auth::CredentialStore;
use crate::models::{
    Acknowledgement, Commission, CommissionSettings, CustomerOnboarding, InstallerRegistration,
    LoginRequest, LoginResponse, PayoutRequest, Pricing, ProfileUpdate, ReferralCode,
    ResetPasswordRequest, TrainingResource, User, VerifyEmailRequest,
};

pub(crate) fn user(id: i64) -> User {
    User {
        id,
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        email: "a@b.com".to_string(),
        role: "INSTALLER".to_string(),
        is_verified: true,
        phone: None,
        bank_name: None,
        account_number: None,
        account_name: None,
    }
}

/// Backend double: canned data, per-endpoint failures, call counts and
/// captured request bodies.
#[derive(Default)]
pub(crate) struct FakeBackend {
    credentials: Option<Arc<CredentialStore>>,
    access_token: String,
    refresh_token: String,
    user: Mutex<Option<User>>,
    login_error: Option<Option<String>>,
    failing: HashSet<&'static str>,
    codes: Vec<ReferralCode>,
    commissions: Vec<Commission>,
    training: Vec<TrainingResource>,
    payouts: Vec<PayoutRequest>,
    settings: CommissionSettings,
    pricing: Pricing,
    calls: Mutex<HashMap<&'static str, usize>>,
    bodies: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Login hands out these tokens; profile fetches accept only `access_token`.
    pub(crate) fn accepting(access_token: &str, refresh_token: &str, user_id: i64) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            user: Mutex::new(Some(user(user_id))),
            ..Self::default()
        }
    }

    /// Login fails; `Some(msg)` as a backend message, `None` as a bare 5xx.
    pub(crate) fn rejecting_login(message: Option<&str>) -> Self {
        Self {
            login_error: Some(message.map(str::to_string)),
            ..Self::default()
        }
    }

    /// Profile fetches compare against the token in this store.
    pub(crate) fn with_credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub(crate) fn failing(mut self, endpoint: &'static str) -> Self {
        self.failing.insert(endpoint);
        self
    }

    pub(crate) fn with_codes(mut self, codes: Vec<ReferralCode>) -> Self {
        self.codes = codes;
        self
    }

    pub(crate) fn with_commissions(mut self, commissions: Vec<Commission>) -> Self {
        self.commissions = commissions;
        self
    }

    pub(crate) fn with_training(mut self, training: Vec<TrainingResource>) -> Self {
        self.training = training;
        self
    }

    pub(crate) fn with_payouts(mut self, payouts: Vec<PayoutRequest>) -> Self {
        self.payouts = payouts;
        self
    }

    pub(crate) fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub(crate) fn set_profile_name(&self, first: &str, last: &str) {
        let mut user = self.user.lock().unwrap();
        if let Some(user) = user.as_mut() {
            user.first_name = first.to_string();
            user.last_name = last.to_string();
        }
    }

    pub(crate) fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    /// Bodies sent to `endpoint`, oldest first.
    pub(crate) fn bodies(&self, endpoint: &str) -> Vec<serde_json::Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn hit(&self, endpoint: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
        if self.failing.contains(endpoint) {
            return Err(ApiError::ServerError(format!("{} unavailable", endpoint)));
        }
        Ok(())
    }

    fn record<B: Serialize>(&self, endpoint: &'static str, body: &B) {
        let value = serde_json::to_value(body).unwrap();
        self.bodies.lock().unwrap().push((endpoint, value));
    }

    fn ack(&self, endpoint: &'static str) -> Result<Acknowledgement, ApiError> {
        self.hit(endpoint)?;
        Ok(Acknowledgement {
            message: Some(format!("{} ok", endpoint)),
        })
    }
}

#[async_trait]
impl PortalBackend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.hit("login")?;
        if let Some(message) = &self.login_error {
            return Err(match message {
                Some(message) => ApiError::Rejected {
                    status: 401,
                    message: message.clone(),
                },
                None => ApiError::ServerError("upstream".to_string()),
            });
        }
        let mut user = self.user.lock().unwrap().clone().unwrap_or_else(|| user(1));
        user.email = request.email.clone();
        Ok(LoginResponse {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user,
        })
    }

    async fn register_installer(
        &self,
        registration: &InstallerRegistration,
    ) -> Result<Acknowledgement, ApiError> {
        self.record("register_installer", registration);
        self.ack("register_installer")
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<Acknowledgement, ApiError> {
        self.record("verify_email", request);
        self.ack("verify_email")
    }

    async fn resend_otp(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        self.record("resend_otp", &email);
        self.ack("resend_otp")
    }

    async fn fetch_profile(&self) -> Result<User, ApiError> {
        self.hit("fetch_profile")?;
        let token = self.credentials.as_ref().and_then(|c| c.access_token());
        if token.as_deref() != Some(self.access_token.as_str()) {
            return Err(ApiError::Unauthorized);
        }
        self.user.lock().unwrap().clone().ok_or(ApiError::Unauthorized)
    }

    async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        self.record("request_password_reset", &email);
        self.ack("request_password_reset")
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Acknowledgement, ApiError> {
        self.record("reset_password", request);
        self.ack("reset_password")
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Acknowledgement, ApiError> {
        self.record("update_profile", update);
        self.ack("update_profile")
    }

    async fn fetch_referral_codes(&self) -> Result<Vec<ReferralCode>, ApiError> {
        self.hit("fetch_referral_codes")?;
        Ok(self.codes.clone())
    }

    async fn generate_referral_code(&self, code: Option<&str>) -> Result<Acknowledgement, ApiError> {
        self.record("generate_referral_code", &code);
        self.ack("generate_referral_code")
    }

    async fn fetch_commissions(&self) -> Result<Vec<Commission>, ApiError> {
        self.hit("fetch_commissions")?;
        Ok(self.commissions.clone())
    }

    async fn fetch_training_resources(&self) -> Result<Vec<TrainingResource>, ApiError> {
        self.hit("fetch_training_resources")?;
        Ok(self.training.clone())
    }

    async fn fetch_payout_requests(&self) -> Result<Vec<PayoutRequest>, ApiError> {
        self.hit("fetch_payout_requests")?;
        Ok(self.payouts.clone())
    }

    async fn request_payout(&self) -> Result<Acknowledgement, ApiError> {
        self.ack("request_payout")
    }

    async fn fetch_commission_settings(&self) -> Result<CommissionSettings, ApiError> {
        self.hit("fetch_commission_settings")?;
        Ok(self.settings.clone())
    }

    async fn fetch_pricing(&self) -> Result<Pricing, ApiError> {
        self.hit("fetch_pricing")?;
        Ok(self.pricing.clone())
    }

    async fn register_customer(&self, onboarding: &CustomerOnboarding) -> Result<Acknowledgement, ApiError> {
        self.record("register_customer", onboarding);
        self.ack("register_customer")
    }
}
