use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cookie::CookieJar;
use super::store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Name shared by the access-token cookie and its durable entry
pub const ACCESS_TOKEN_KEY: &str = "auth_token";

/// Durable entry holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// The access-token cookie expires a week after login.
pub const COOKIE_LIFETIME_DAYS: i64 = 7;

/// Keychain service name for the keyring backend
const SERVICE_NAME: &str = "partnerdesk";

const COOKIE_FILE: &str = "cookies.json";
const STORAGE_FILE: &str = "storage.json";

/// Where the durable token mirror lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

/// The two credential mirrors: an `auth_token` cookie with a 7-day expiry and
/// durable `auth_token`/`refresh_token` entries with none.
///
/// Writes go to both or neither; clears always touch every entry.
pub struct CredentialStore {
    cookies: CookieJar,
    durable: Box<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(cookies: CookieJar, durable: Box<dyn KeyValueStore>) -> Self {
        Self { cookies, durable }
    }

    pub fn in_memory() -> Self {
        Self::new(CookieJar::in_memory(), Box::new(MemoryStore::new()))
    }

    /// Open the on-disk mirrors under `data_dir`.
    pub fn open(data_dir: &Path, backend: CredentialBackend) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let cookies = CookieJar::new(Box::new(FileStore::new(data_dir.join(COOKIE_FILE))));
        let durable: Box<dyn KeyValueStore> = match backend {
            CredentialBackend::File => Box::new(FileStore::new(data_dir.join(STORAGE_FILE))),
            CredentialBackend::Keyring => Box::new(KeyringStore::new(SERVICE_NAME)),
        };
        debug!(?backend, dir = %data_dir.display(), "Credential store opened");
        Ok(Self::new(cookies, durable))
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn durable(&self) -> &dyn KeyValueStore {
        self.durable.as_ref()
    }

    /// Current access token: the cookie if set, else the durable entry.
    /// Read failures are logged and treated as "no token".
    pub fn access_token(&self) -> Option<String> {
        let from_cookie = self.cookies.get(ACCESS_TOKEN_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read token cookie");
            None
        });

        from_cookie
            .filter(|t| !t.is_empty())
            .or_else(|| self.durable_value(ACCESS_TOKEN_KEY))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.durable_value(REFRESH_TOKEN_KEY)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token().is_some()
    }

    fn durable_value(&self, key: &str) -> Option<String> {
        match self.durable.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read durable store");
                None
            }
        }
    }

    /// Write both mirrors. If any write fails, the ones already made are
    /// rolled back so no partial session is left behind.
    pub fn store_tokens(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.cookies
            .set(ACCESS_TOKEN_KEY, access_token, Duration::days(COOKIE_LIFETIME_DAYS))
            .context("Failed to set token cookie")?;

        if let Err(e) = self.durable.set(ACCESS_TOKEN_KEY, access_token) {
            self.rollback();
            return Err(e).context("Failed to persist access token");
        }

        if let Err(e) = self.durable.set(REFRESH_TOKEN_KEY, refresh_token) {
            self.rollback();
            return Err(e).context("Failed to persist refresh token");
        }

        debug!("Session tokens stored");
        Ok(())
    }

    fn rollback(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to roll back partial credential write");
        }
    }

    /// Remove the cookie and both durable entries. Every removal is attempted;
    /// the first failure is returned.
    pub fn clear(&self) -> Result<()> {
        let results = [
            self.cookies
                .remove(ACCESS_TOKEN_KEY)
                .context("Failed to remove token cookie"),
            self.durable
                .remove(ACCESS_TOKEN_KEY)
                .context("Failed to remove access token"),
            self.durable
                .remove(REFRESH_TOKEN_KEY)
                .context("Failed to remove refresh token"),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Credential clear step failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Session tokens cleared");
                Ok(())
            }
        }
    }
}
