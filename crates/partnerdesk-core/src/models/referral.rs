//! Referral program records: codes, commissions, payouts, training content.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// Public registration page that referral links point at.
pub const REFERRAL_LINK_BASE: &str = "https://www.betadaypos.com/auth/register";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralCode {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub code: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ReferralCode {
    /// Sharing link that pre-fills this code on the registration page.
    pub fn referral_link(&self) -> String {
        format!("{}?ref={}", REFERRAL_LINK_BASE, self.code)
    }
}

/// Body for `POST /referrals/codes`; omitting `code` lets the backend pick one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateCodeRequest {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    Onboarding,
    Renewal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Paid,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionStatus::Pending => write!(f, "PENDING"),
            CommissionStatus::Paid => write!(f, "PAID"),
            CommissionStatus::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: RecordId,
    #[serde(default)]
    pub business_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub commission_type: CommissionType,
    pub amount: f64,
    pub status: CommissionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Commission {
    pub fn is_pending(&self) -> bool {
        self.status == CommissionStatus::Pending
    }
}

/// `/referrals/commissions` answers either a bare list or `{"commissions": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum CommissionsResponse {
    Wrapped { commissions: Vec<Commission> },
    List(Vec<Commission>),
}

impl CommissionsResponse {
    pub(crate) fn into_vec(self) -> Vec<Commission> {
        match self {
            CommissionsResponse::Wrapped { commissions } | CommissionsResponse::List(commissions) => {
                commissions
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Video,
    Article,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResource {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

fn youtube_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").ok())
        .as_ref()
}

impl TrainingResource {
    pub fn is_video(&self) -> bool {
        self.resource_type == ResourceType::Video
    }

    /// The 11-character YouTube video id embedded in `url`, if there is one.
    pub fn youtube_id(&self) -> Option<&str> {
        let captures = youtube_pattern()?.captures(&self.url)?;
        let id = captures.get(2)?.as_str();
        (id.len() == 11).then_some(id)
    }

    /// Embeddable player URL for video resources.
    pub fn embed_url(&self) -> Option<String> {
        self.youtube_id()
            .map(|id| format!("https://www.youtube.com/embed/{}?autoplay=1", id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Completed,
    Rejected,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "PENDING"),
            PayoutStatus::Completed => write!(f, "COMPLETED"),
            PayoutStatus::Rejected => write!(f, "REJECTED"),
            PayoutStatus::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: RecordId,
    pub amount: f64,
    pub status: PayoutStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Commission program configuration from `/referrals/settings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionSettings {
    #[serde(default)]
    pub enable_renewal_commission: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
