//! Partner dashboard: referral codes, commissions, payouts, training and
//! pricing, loaded together and summarized.
//!
//! Sections load concurrently and independently. A section whose request
//! fails is left empty and listed in `failures`; the rest still render.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{ApiError, PortalBackend};
use crate::error::PortalError;
use crate::models::{
    BusinessDetails, Commission, CommissionSettings, CustomerOnboarding, OwnerAccount,
    PayoutRequest, Pricing, ReferralCode, TrainingResource,
};
use crate::utils::format_currency;

/// Smallest pending balance that can be withdrawn.
pub const MIN_PAYOUT_AMOUNT: f64 = 5000.0;

pub const NO_CODE: &str = "Generate a code first";
pub const MISSING_ONBOARDING_DETAILS: &str = "Please fill in essential details";
pub const CODE_GENERATED: &str = "Your unique referral token has been generated!";
pub const PAYOUT_REQUESTED: &str = "Payout request submitted successfully!";
pub const CUSTOMER_ONBOARDED: &str = "Customer onboarded successfully!";

/// Address sent for onboarded businesses when none was entered.
const ADDRESS_PENDING: &str = "Address pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardSection {
    ReferralCodes,
    Commissions,
    Training,
    Payouts,
    Settings,
    Pricing,
}

impl fmt::Display for DashboardSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DashboardSection::ReferralCodes => "referral codes",
            DashboardSection::Commissions => "commissions",
            DashboardSection::Training => "training resources",
            DashboardSection::Payouts => "payout requests",
            DashboardSection::Settings => "commission settings",
            DashboardSection::Pricing => "pricing",
        };
        f.write_str(name)
    }
}

/// Headline figures derived from the commission list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardSummary {
    /// Sum of every commission
    pub total_earnings: f64,
    /// Sum of commissions not yet paid out
    pub pending_balance: f64,
    /// Distinct businesses behind the commissions
    pub referred_businesses: usize,
    /// One sale per commission record
    pub total_sales: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub codes: Vec<ReferralCode>,
    pub commissions: Vec<Commission>,
    pub training: Vec<TrainingResource>,
    pub payouts: Vec<PayoutRequest>,
    pub settings: CommissionSettings,
    pub pricing: Pricing,
    /// Sections whose request failed on the last load.
    #[serde(default)]
    pub failures: Vec<DashboardSection>,
}

/// Keep a section's data, or record the failure and fall back to empty.
fn settle<T: Default>(
    section: DashboardSection,
    result: Result<T, ApiError>,
    failures: &mut Vec<DashboardSection>,
) -> T {
    match result {
        Ok(data) => data,
        Err(e) => {
            warn!(section = %section, error = %e, "Failed to load dashboard section");
            failures.push(section);
            T::default()
        }
    }
}

impl Dashboard {
    /// Fetch every section concurrently and wait for all of them.
    pub async fn load(backend: &dyn PortalBackend) -> Self {
        let (codes, commissions, training, payouts, settings, pricing) = tokio::join!(
            backend.fetch_referral_codes(),
            backend.fetch_commissions(),
            backend.fetch_training_resources(),
            backend.fetch_payout_requests(),
            backend.fetch_commission_settings(),
            backend.fetch_pricing(),
        );

        let mut failures = Vec::new();
        let dashboard = Self {
            codes: settle(DashboardSection::ReferralCodes, codes, &mut failures),
            commissions: settle(DashboardSection::Commissions, commissions, &mut failures),
            training: settle(DashboardSection::Training, training, &mut failures),
            payouts: settle(DashboardSection::Payouts, payouts, &mut failures),
            settings: settle(DashboardSection::Settings, settings, &mut failures),
            pricing: settle(DashboardSection::Pricing, pricing, &mut failures),
            failures,
        };
        debug!(
            codes = dashboard.codes.len(),
            commissions = dashboard.commissions.len(),
            failed = dashboard.failures.len(),
            "Dashboard loaded"
        );
        dashboard
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> DashboardSummary {
        let businesses: HashSet<_> = self
            .commissions
            .iter()
            .filter_map(|c| c.business_id.as_ref())
            .collect();

        DashboardSummary {
            total_earnings: self.commissions.iter().map(|c| c.amount).sum(),
            pending_balance: self.pending_balance(),
            referred_businesses: businesses.len(),
            total_sales: self.commissions.len(),
        }
    }

    pub fn pending_balance(&self) -> f64 {
        self.commissions
            .iter()
            .filter(|c| c.is_pending())
            .map(|c| c.amount)
            .sum()
    }

    pub fn can_request_payout(&self) -> bool {
        self.pending_balance() >= MIN_PAYOUT_AMOUNT
    }

    /// How much more pending balance is needed before a payout is allowed.
    pub fn payout_shortfall(&self) -> f64 {
        (MIN_PAYOUT_AMOUNT - self.pending_balance()).max(0.0)
    }

    /// Ask for the pending balance to be paid out. Below the minimum the
    /// request is refused here and never sent.
    pub async fn request_payout(&self, backend: &dyn PortalBackend) -> Result<(), PortalError> {
        if !self.can_request_payout() {
            return Err(PortalError::validation(format!(
                "Minimum payout amount is {}. You need {} more to withdraw.",
                format_currency(MIN_PAYOUT_AMOUNT).trim_end_matches(".00"),
                format_currency(self.payout_shortfall())
            )));
        }

        backend
            .request_payout()
            .await
            .map_err(PortalError::api("Failed to request payout"))?;
        info!(amount = self.pending_balance(), "Payout requested");
        Ok(())
    }

    /// The code shared in referral links and attached to onboardings.
    pub fn primary_code(&self) -> Option<&ReferralCode> {
        self.codes.first()
    }

    pub fn referral_link(&self) -> Result<String, PortalError> {
        self.primary_code()
            .map(ReferralCode::referral_link)
            .ok_or_else(|| PortalError::validation(NO_CODE))
    }

    /// Register a customer business directly, credited to this partner's
    /// primary code.
    pub async fn onboard_customer(
        &self,
        backend: &dyn PortalBackend,
        form: &OnboardingForm,
    ) -> Result<(), PortalError> {
        let referral_token = self.primary_code().map(|c| c.code.clone());
        let onboarding = form.to_request(referral_token)?;

        backend
            .register_customer(&onboarding)
            .await
            .map_err(PortalError::api("Onboarding failed"))?;
        info!(business = %onboarding.business.name, "Customer onboarded");
        Ok(())
    }
}

/// Ask the backend for a new referral code. `None` lets the backend pick it.
pub async fn generate_code(backend: &dyn PortalBackend, code: Option<&str>) -> Result<(), PortalError> {
    let code = code.map(str::trim).filter(|c| !c.is_empty());
    backend
        .generate_referral_code(code)
        .await
        .map_err(PortalError::api("Failed to generate code"))?;
    Ok(())
}

/// Fields a partner fills in to onboard a customer business.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingForm {
    pub business_name: String,
    pub business_type: String,
    pub address: String,
    pub city: String,
    pub currency: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub base_plan_type: String,
    pub modules: Vec<String>,
}

impl Default for OnboardingForm {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            business_type: "RETAIL".to_string(),
            address: String::new(),
            city: "Lagos".to_string(),
            currency: "NGN".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: "password123".to_string(),
            base_plan_type: "TRIAL".to_string(),
            modules: Vec::new(),
        }
    }
}

impl OnboardingForm {
    pub fn to_request(&self, referral_token: Option<String>) -> Result<CustomerOnboarding, PortalError> {
        let essentials = [&self.business_name, &self.email, &self.first_name];
        if essentials.iter().any(|f| f.trim().is_empty()) {
            return Err(PortalError::validation(MISSING_ONBOARDING_DETAILS));
        }

        let address = match self.address.trim() {
            "" => ADDRESS_PENDING.to_string(),
            address => address.to_string(),
        };

        Ok(CustomerOnboarding {
            business: BusinessDetails {
                name: self.business_name.trim().to_string(),
                business_type: self.business_type.clone(),
                address,
                city: self.city.clone(),
                currency: self.currency.clone(),
            },
            user: OwnerAccount {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
            base_plan_type: self.base_plan_type.clone(),
            modules: self.modules.clone(),
            use_sample_data: true,
            referral_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommissionStatus, CommissionType, PayoutStatus, RecordId};
    use crate::testing::FakeBackend;

    fn commission(id: i64, business: Option<i64>, amount: f64, status: CommissionStatus) -> Commission {
        Commission {
            id: RecordId::Number(id),
            business_id: business.map(RecordId::Number),
            commission_type: CommissionType::Onboarding,
            amount,
            status,
            created_at: None,
        }
    }

    fn code(code: &str) -> ReferralCode {
        ReferralCode {
            id: None,
            code: code.to_string(),
            created_at: None,
        }
    }

    fn dashboard_with(commissions: Vec<Commission>) -> Dashboard {
        Dashboard {
            commissions,
            ..Dashboard::default()
        }
    }

    #[tokio::test]
    async fn test_load_collects_every_section() {
        let pricing: Pricing = serde_json::from_str(
            r#"{"plans": [{"type": "MONTHLY", "name": "Monthly", "duration_days": 30, "price": 15000, "currency": "NGN"}]}"#,
        )
        .unwrap();
        let backend = FakeBackend::new()
            .with_codes(vec![code("ADA123")])
            .with_commissions(vec![commission(1, Some(10), 2500.0, CommissionStatus::Pending)])
            .with_payouts(vec![PayoutRequest {
                id: RecordId::Number(7),
                amount: 6000.0,
                status: PayoutStatus::Completed,
                created_at: None,
            }])
            .with_pricing(pricing);

        let dashboard = Dashboard::load(&backend).await;
        assert!(dashboard.is_complete());
        assert_eq!(dashboard.codes.len(), 1);
        assert_eq!(dashboard.commissions.len(), 1);
        assert_eq!(dashboard.payouts[0].status, PayoutStatus::Completed);
        assert_eq!(dashboard.pricing.plan("monthly").map(|p| p.duration_days), Some(30));
        assert_eq!(backend.calls("fetch_commission_settings"), 1);
    }

    #[tokio::test]
    async fn test_failed_section_does_not_blank_the_rest() {
        let backend = FakeBackend::new()
            .with_codes(vec![code("ADA123")])
            .with_commissions(vec![commission(1, Some(10), 2500.0, CommissionStatus::Pending)])
            .failing("fetch_training_resources")
            .failing("fetch_pricing");

        let dashboard = Dashboard::load(&backend).await;
        assert_eq!(
            dashboard.failures,
            vec![DashboardSection::Training, DashboardSection::Pricing]
        );
        assert_eq!(dashboard.codes.len(), 1);
        assert_eq!(dashboard.commissions.len(), 1);
        assert!(dashboard.training.is_empty());
    }

    #[test]
    fn test_summary_statistics() {
        let dashboard = dashboard_with(vec![
            commission(1, Some(10), 2000.0, CommissionStatus::Pending),
            commission(2, Some(10), 1500.0, CommissionStatus::Paid),
            commission(3, Some(11), 1000.0, CommissionStatus::Pending),
            commission(4, None, 500.0, CommissionStatus::Other),
        ]);

        let summary = dashboard.summary();
        assert_eq!(summary.total_earnings, 5000.0);
        assert_eq!(summary.pending_balance, 3000.0);
        assert_eq!(summary.referred_businesses, 2);
        assert_eq!(summary.total_sales, 4);
    }

    #[tokio::test]
    async fn test_payout_below_minimum_never_sent() {
        let backend = FakeBackend::new();
        let dashboard = dashboard_with(vec![commission(1, Some(10), 3500.0, CommissionStatus::Pending)]);

        assert!(!dashboard.can_request_payout());
        let err = dashboard.request_payout(&backend).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Minimum payout amount is ₦5,000. You need ₦1,500.00 more to withdraw."
        );
        assert_eq!(backend.calls("request_payout"), 0);
    }

    #[tokio::test]
    async fn test_payout_at_minimum_is_sent() {
        let backend = FakeBackend::new();
        let dashboard = dashboard_with(vec![
            commission(1, Some(10), 3000.0, CommissionStatus::Pending),
            commission(2, Some(11), 2000.0, CommissionStatus::Pending),
            commission(3, Some(12), 9000.0, CommissionStatus::Paid),
        ]);

        assert!(dashboard.can_request_payout());
        assert_eq!(dashboard.payout_shortfall(), 0.0);
        dashboard.request_payout(&backend).await.expect("payout");
        assert_eq!(backend.calls("request_payout"), 1);
    }

    #[tokio::test]
    async fn test_payout_backend_failure_uses_fallback() {
        let backend = FakeBackend::new().failing("request_payout");
        let dashboard = dashboard_with(vec![commission(1, Some(10), 6000.0, CommissionStatus::Pending)]);

        let err = dashboard.request_payout(&backend).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to request payout");
    }

    #[test]
    fn test_referral_link_uses_first_code() {
        let mut dashboard = Dashboard::default();
        assert_eq!(dashboard.referral_link().unwrap_err().to_string(), NO_CODE);

        dashboard.codes = vec![code("ADA123"), code("OLD999")];
        assert_eq!(
            dashboard.referral_link().unwrap(),
            "https://www.betadaypos.com/auth/register?ref=ADA123"
        );
    }

    #[tokio::test]
    async fn test_generate_code_blank_means_backend_picks() {
        let backend = FakeBackend::new();
        generate_code(&backend, Some("  ")).await.unwrap();
        generate_code(&backend, Some("ADA2024")).await.unwrap();

        let bodies = backend.bodies("generate_referral_code");
        assert_eq!(bodies[0], serde_json::Value::Null);
        assert_eq!(bodies[1], "ADA2024");
    }

    #[tokio::test]
    async fn test_onboarding_requires_essentials() {
        let backend = FakeBackend::new();
        let dashboard = Dashboard::default();
        let form = OnboardingForm {
            business_name: "Mama Put".to_string(),
            ..OnboardingForm::default()
        };

        let err = dashboard.onboard_customer(&backend, &form).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_ONBOARDING_DETAILS);
        assert_eq!(backend.calls("register_customer"), 0);
    }

    #[tokio::test]
    async fn test_onboarding_body() {
        let backend = FakeBackend::new();
        let dashboard = Dashboard {
            codes: vec![code("ADA123")],
            ..Dashboard::default()
        };
        let form = OnboardingForm {
            business_name: "Mama Put".to_string(),
            first_name: "Chidi".to_string(),
            email: "chidi@example.com".to_string(),
            modules: vec!["INVENTORY".to_string()],
            ..OnboardingForm::default()
        };

        dashboard.onboard_customer(&backend, &form).await.expect("onboard");

        let body = &backend.bodies("register_customer")[0];
        assert_eq!(body["business"]["type"], "RETAIL");
        assert_eq!(body["business"]["address"], "Address pending");
        assert_eq!(body["business"]["city"], "Lagos");
        assert_eq!(body["user"]["password"], "password123");
        assert_eq!(body["base_plan_type"], "TRIAL");
        assert_eq!(body["use_sample_data"], true);
        assert_eq!(body["referral_token"], "ADA123");
        assert_eq!(body["modules"][0], "INVENTORY");
    }

    #[test]
    fn test_dashboard_survives_json_round_trip() {
        let dashboard = Dashboard {
            codes: vec![code("ADA123")],
            failures: vec![DashboardSection::Payouts],
            ..Dashboard::default()
        };
        let json = serde_json::to_string(&dashboard).unwrap();
        let restored: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, dashboard);
    }
}
