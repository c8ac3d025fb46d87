//! Request and response bodies for the `/auth` endpoints and `/profile`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::User;

/// Role sent with every self-service partner registration.
pub const INSTALLER_ROLE: &str = "INSTALLER";

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub user: User,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallerRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Body for endpoints that only need an address (OTP resend, reset request).
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Editable profile and bank settlement fields sent to `PUT /profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

impl From<&User> for ProfileUpdate {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            bank_name: user.bank_name.clone().unwrap_or_default(),
            account_number: user.account_number.clone().unwrap_or_default(),
            account_name: user.account_name.clone().unwrap_or_default(),
        }
    }
}

/// Success body of endpoints whose payload the portal does not use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Acknowledgement {
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Accepts any success body; keeps `message` when the body is an object carrying one.
    pub fn from_body(body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_hides_password() {
        let req = LoginRequest::new("a@b.com", "secret123");
        let debug = format!("{:?}", req);
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("secret123"));
    }

    #[test]
    fn test_login_response_without_refresh_token() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"access_token": "T1", "user": {"id": 1}}"#).expect("login response");
        assert_eq!(resp.access_token, "T1");
        assert_eq!(resp.refresh_token, "");
        assert!(!format!("{:?}", resp).contains("T1"));
    }

    #[test]
    fn test_acknowledgement_tolerates_any_body() {
        assert_eq!(
            Acknowledgement::from_body(r#"{"message": "OTP sent"}"#).message.as_deref(),
            Some("OTP sent")
        );
        assert_eq!(Acknowledgement::from_body("").message, None);
        assert_eq!(Acknowledgement::from_body("[1,2]").message, None);
    }

    #[test]
    fn test_profile_update_from_user() {
        let user: User = serde_json::from_str(
            r#"{"id": 2, "first_name": "Ada", "last_name": "Obi", "phone": "0803", "bank_name": "GTBank"}"#,
        )
        .expect("user");
        let update = ProfileUpdate::from(&user);
        assert_eq!(update.phone, "0803");
        assert_eq!(update.bank_name, "GTBank");
        assert_eq!(update.account_number, "");
    }
}
