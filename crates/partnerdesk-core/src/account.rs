//! Self-service account flows: registration, email verification, password
//! recovery and profile edits.
//!
//! Every flow validates locally first; a form that fails validation never
//! reaches the backend. Backend failures surface the backend's own message
//! or the flow's fallback text.

use tracing::{error, info};

use crate::api::PortalBackend;
use crate::auth::{Notice, SessionManager};
use crate::error::PortalError;
use crate::models::{
    InstallerRegistration, ProfileUpdate, ResetPasswordRequest, User, VerifyEmailRequest,
    INSTALLER_ROLE,
};

pub const PASSWORD_MISMATCH: &str = "Passwords don't match";
pub const MISSING_FIELDS: &str = "Please fill in all fields";

pub const REGISTERED: &str = "Registration successful! Please verify your email.";
pub const EMAIL_VERIFIED: &str = "Email verified! You can now login.";
pub const OTP_RESENT: &str = "Verification code resent";
pub const RESET_CODE_SENT: &str = "Reset code sent to your email";
pub const PASSWORD_RESET: &str = "Password reset successfully! You can now login.";
pub const PROFILE_UPDATED: &str = "Profile and Bank details updated!";

fn require(fields: &[&str]) -> Result<(), PortalError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(PortalError::validation(MISSING_FIELDS));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Build the request body, or the message explaining why not.
    pub fn validate(&self) -> Result<InstallerRegistration, PortalError> {
        require(&[
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.password.as_str(),
        ])?;
        if self.password != self.confirm_password {
            return Err(PortalError::validation(PASSWORD_MISMATCH));
        }
        Ok(InstallerRegistration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: INSTALLER_ROLE.to_string(),
        })
    }
}

pub async fn register_installer(
    backend: &dyn PortalBackend,
    form: &RegistrationForm,
) -> Result<(), PortalError> {
    let registration = form.validate()?;
    backend
        .register_installer(&registration)
        .await
        .map_err(PortalError::api("Registration failed"))?;
    info!(email = %registration.email, "Installer registered");
    Ok(())
}

pub async fn verify_email(backend: &dyn PortalBackend, email: &str, code: &str) -> Result<(), PortalError> {
    require(&[email, code])?;
    let request = VerifyEmailRequest {
        email: email.trim().to_string(),
        code: code.trim().to_string(),
    };
    backend
        .verify_email(&request)
        .await
        .map_err(PortalError::api("Verification failed"))?;
    info!(email = %request.email, "Email verified");
    Ok(())
}

pub async fn resend_otp(backend: &dyn PortalBackend, email: &str) -> Result<(), PortalError> {
    require(&[email])?;
    backend
        .resend_otp(email.trim())
        .await
        .map_err(PortalError::api("Failed to resend code"))?;
    Ok(())
}

pub async fn request_password_reset(backend: &dyn PortalBackend, email: &str) -> Result<(), PortalError> {
    require(&[email])?;
    backend
        .request_password_reset(email.trim())
        .await
        .map_err(PortalError::api("Failed to request password reset"))?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct PasswordResetForm {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordResetForm {
    pub fn validate(&self) -> Result<ResetPasswordRequest, PortalError> {
        require(&[self.email.as_str(), self.code.as_str(), self.new_password.as_str()])?;
        if self.new_password != self.confirm_password {
            return Err(PortalError::validation(PASSWORD_MISMATCH));
        }
        Ok(ResetPasswordRequest {
            email: self.email.trim().to_string(),
            code: self.code.trim().to_string(),
            new_password: self.new_password.clone(),
        })
    }
}

pub async fn reset_password(backend: &dyn PortalBackend, form: &PasswordResetForm) -> Result<(), PortalError> {
    let request = form.validate()?;
    backend
        .reset_password(&request)
        .await
        .map_err(PortalError::api("Failed to reset password. Please check your code."))?;
    info!(email = %request.email, "Password reset");
    Ok(())
}

/// Save profile and bank details, then reload the signed-in user so the
/// session reflects the change.
///
/// The saved notice goes out as soon as the backend accepts the update. A
/// failed reload afterwards ends the session.
pub async fn update_profile(session: &SessionManager, update: &ProfileUpdate) -> Result<User, PortalError> {
    require(&[update.first_name.as_str(), update.last_name.as_str()])?;
    session
        .backend()
        .update_profile(update)
        .await
        .map_err(PortalError::api("Failed to update profile"))?;
    session.notify(Notice::success(PROFILE_UPDATED)).await;

    session.refresh_user().await.inspect_err(|e| {
        error!(error = %e, "Profile saved but reload failed");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{CredentialStore, Route, SessionEvent};
    use crate::models::LoginRequest;
    use crate::testing::FakeBackend;

    fn registration(password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: " a@b.com ".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_registration_mismatch_never_sent() {
        let backend = FakeBackend::new();
        let err = register_installer(&backend, &registration("secret123", "secret124"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), PASSWORD_MISMATCH);
        assert_eq!(backend.calls("register_installer"), 0);
    }

    #[tokio::test]
    async fn test_registration_sends_installer_role() {
        let backend = FakeBackend::new();
        register_installer(&backend, &registration("secret123", "secret123"))
            .await
            .expect("register");

        let bodies = backend.bodies("register_installer");
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["role"], "INSTALLER");
        assert_eq!(bodies[0]["email"], "a@b.com");
        assert!(bodies[0].get("confirm_password").is_none());
    }

    #[tokio::test]
    async fn test_registration_failure_uses_fallback() {
        let backend = FakeBackend::new().failing("register_installer");
        let err = register_installer(&backend, &registration("secret123", "secret123"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Registration failed");
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut form = registration("secret123", "secret123");
        form.first_name = "  ".to_string();
        assert_eq!(form.validate().unwrap_err().to_string(), MISSING_FIELDS);
    }

    #[tokio::test]
    async fn test_reset_mismatch_never_sent() {
        let backend = FakeBackend::new();
        let form = PasswordResetForm {
            email: "a@b.com".to_string(),
            code: "123456".to_string(),
            new_password: "newpass1".to_string(),
            confirm_password: "newpass2".to_string(),
        };

        let err = reset_password(&backend, &form).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backend.calls("reset_password"), 0);
    }

    #[tokio::test]
    async fn test_reset_sends_new_password() {
        let backend = FakeBackend::new();
        let form = PasswordResetForm {
            email: "a@b.com".to_string(),
            code: "123456".to_string(),
            new_password: "newpass1".to_string(),
            confirm_password: "newpass1".to_string(),
        };

        reset_password(&backend, &form).await.expect("reset");
        let body = &backend.bodies("reset_password")[0];
        assert_eq!(body["new_password"], "newpass1");
        assert_eq!(body["code"], "123456");
    }

    #[tokio::test]
    async fn test_verify_and_recovery_fallbacks() {
        let backend = FakeBackend::new()
            .failing("verify_email")
            .failing("resend_otp")
            .failing("request_password_reset");

        let err = verify_email(&backend, "a@b.com", "000000").await.unwrap_err();
        assert_eq!(err.to_string(), "Verification failed");
        let err = resend_otp(&backend, "a@b.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to resend code");
        let err = request_password_reset(&backend, "a@b.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to request password reset");
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_session_user() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let backend = Arc::new(FakeBackend::accepting("T1", "R1", 1).with_credentials(credentials.clone()));
        let (session, _rx) = SessionManager::new(backend.clone(), credentials);
        session.login(LoginRequest::new("a@b.com", "secret123")).await.unwrap();

        let mut update = ProfileUpdate::from(&session.current_user().await.unwrap());
        update.bank_name = "GTBank".to_string();
        backend.set_profile_name("Ada", "Okafor");

        let user = update_profile(&session, &update).await.expect("update");
        assert_eq!(user.last_name, "Okafor");
        assert_eq!(backend.bodies("update_profile")[0]["bank_name"], "GTBank");
        assert_eq!(session.current_user().await.map(|u| u.last_name), Some("Okafor".to_string()));
    }

    #[tokio::test]
    async fn test_profile_saved_then_failed_reload_ends_session() {
        let credentials = Arc::new(CredentialStore::in_memory());
        let backend = Arc::new(FakeBackend::accepting("T1", "R1", 1).with_credentials(credentials.clone()));
        let (session, mut rx) = SessionManager::new(backend.clone(), credentials.clone());
        session.login(LoginRequest::new("a@b.com", "secret123")).await.unwrap();
        while rx.try_recv().is_ok() {}

        let update = ProfileUpdate::from(&session.current_user().await.unwrap());
        credentials.store_tokens("REVOKED", "R1").unwrap();

        assert!(update_profile(&session, &update).await.is_err());
        assert_eq!(backend.calls("update_profile"), 1);
        assert_eq!(
            rx.try_recv().ok(),
            Some(SessionEvent::Notice(Notice::success(PROFILE_UPDATED)))
        );
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Navigate(Route::Login)));
        assert!(!session.is_authenticated().await);
        assert!(!credentials.has_access_token());
    }
}
