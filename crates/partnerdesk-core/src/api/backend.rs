use async_trait::async_trait;

use crate::models::{
    Acknowledgement, Commission, CommissionSettings, CustomerOnboarding, InstallerRegistration,
    LoginRequest, LoginResponse, PayoutRequest, Pricing, ProfileUpdate, ReferralCode,
    ResetPasswordRequest, TrainingResource, User, VerifyEmailRequest,
};

use super::ApiError;

/// Every backend operation the portal uses, one method per endpoint.
///
/// `ApiClient` is the HTTP implementation. Session and dashboard logic only
/// see this trait.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    // ===== Auth =====

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    async fn register_installer(
        &self,
        registration: &InstallerRegistration,
    ) -> Result<Acknowledgement, ApiError>;

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<Acknowledgement, ApiError>;

    async fn resend_otp(&self, email: &str) -> Result<Acknowledgement, ApiError>;

    /// Validates the stored token and returns its user.
    async fn fetch_profile(&self) -> Result<User, ApiError>;

    async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement, ApiError>;

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Acknowledgement, ApiError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Acknowledgement, ApiError>;

    // ===== Referrals =====

    async fn fetch_referral_codes(&self) -> Result<Vec<ReferralCode>, ApiError>;

    async fn generate_referral_code(&self, code: Option<&str>) -> Result<Acknowledgement, ApiError>;

    async fn fetch_commissions(&self) -> Result<Vec<Commission>, ApiError>;

    async fn fetch_training_resources(&self) -> Result<Vec<TrainingResource>, ApiError>;

    async fn fetch_payout_requests(&self) -> Result<Vec<PayoutRequest>, ApiError>;

    async fn request_payout(&self) -> Result<Acknowledgement, ApiError>;

    async fn fetch_commission_settings(&self) -> Result<CommissionSettings, ApiError>;

    // ===== Pricing & onboarding =====

    async fn fetch_pricing(&self) -> Result<Pricing, ApiError>;

    async fn register_customer(&self, onboarding: &CustomerOnboarding) -> Result<Acknowledgement, ApiError>;
}
