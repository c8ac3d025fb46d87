//! Data models for partner portal entities.
//!
//! This module contains the request and response bodies exchanged with the
//! portal backend:
//!
//! - `User`: The signed-in partner, including bank settlement details
//! - Auth bodies: `LoginRequest`, `LoginResponse`, `InstallerRegistration`, ...
//! - Referral program: `ReferralCode`, `Commission`, `PayoutRequest`, `TrainingResource`
//! - Pricing: `Pricing`, `SubscriptionPlan`, `ModulePlan`, `ModuleBundle`
//! - Onboarding: `CustomerOnboarding`

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod onboarding;
pub mod pricing;
pub mod referral;
pub mod user;

pub use auth::{
    Acknowledgement, EmailRequest, InstallerRegistration, LoginRequest, LoginResponse,
    ProfileUpdate, ResetPasswordRequest, VerifyEmailRequest, INSTALLER_ROLE,
};
pub use onboarding::{BusinessDetails, CustomerOnboarding, OwnerAccount};
pub use pricing::{ModuleBundle, ModulePlan, Pricing, SubscriptionPlan};
pub use referral::{
    Commission, CommissionSettings, CommissionStatus, CommissionType, GenerateCodeRequest,
    PayoutRequest, PayoutStatus, ReferralCode, ResourceType, TrainingResource,
};
pub use user::User;

/// Identifier of a backend record. Numeric on most endpoints, but some
/// handlers return string ids, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}
