use serde::Serialize;

/// Business half of a direct customer onboarding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub business_type: String,
    pub address: String,
    pub city: String,
    pub currency: String,
}

/// Owner account created alongside the business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Body for `POST /onboarding/register`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOnboarding {
    pub business: BusinessDetails,
    pub user: OwnerAccount,
    pub base_plan_type: String,
    pub modules: Vec<String>,
    pub use_sample_data: bool,
    pub referral_token: Option<String>,
}
