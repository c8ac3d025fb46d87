//! Cookie jar: named values with a per-entry expiry.
//!
//! Each cookie is stored as a small JSON record in an underlying
//! `KeyValueStore`. Expired cookies read as absent and are dropped on access.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{KeyValueStore, MemoryStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieRecord {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct CookieJar {
    store: Box<dyn KeyValueStore>,
}

impl CookieJar {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Read a cookie, treating expired or unreadable records as absent.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        self.get_at(name, Utc::now())
    }

    pub(crate) fn get_at(&self, name: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(raw) = self.store.get(name)? else {
            return Ok(None);
        };

        let record: CookieRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(cookie = name, error = %e, "Dropping unreadable cookie");
                self.store.remove(name)?;
                return Ok(None);
            }
        };

        if record.expires_at <= now {
            debug!(cookie = name, expired_at = %record.expires_at, "Cookie expired");
            self.store.remove(name)?;
            return Ok(None);
        }

        Ok(Some(record.value))
    }

    /// Set a cookie that expires `max_age` from now.
    pub fn set(&self, name: &str, value: &str, max_age: Duration) -> Result<()> {
        self.set_at(name, value, Utc::now() + max_age)
    }

    pub(crate) fn set_at(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let record = CookieRecord {
            value: value.to_string(),
            expires_at,
        };
        let raw = serde_json::to_string(&record).context("Failed to encode cookie")?;
        self.store.set(name, &raw)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        self.store.remove(name)
    }

    /// Expiry of a live cookie, for display.
    pub fn expires_at(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(name)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str::<CookieRecord>(&raw)
            .ok()
            .map(|r| r.expires_at)
            .filter(|at| *at > Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_lives_until_expiry() {
        let jar = CookieJar::in_memory();
        let now = Utc::now();
        jar.set_at("auth_token", "T1", now + Duration::days(7)).unwrap();

        assert_eq!(
            jar.get_at("auth_token", now + Duration::days(6)).unwrap().as_deref(),
            Some("T1")
        );
        assert_eq!(jar.get_at("auth_token", now + Duration::days(7)).unwrap(), None);
        // Expired record was dropped, so it stays gone even for an earlier clock.
        assert_eq!(jar.get_at("auth_token", now).unwrap(), None);
    }

    #[test]
    fn test_set_uses_max_age() {
        let jar = CookieJar::in_memory();
        jar.set("auth_token", "T1", Duration::days(7)).unwrap();

        let expires = jar.expires_at("auth_token").unwrap().expect("expiry");
        let remaining = expires - Utc::now();
        assert!(remaining > Duration::days(6) && remaining <= Duration::days(7));
        assert_eq!(jar.get("auth_token").unwrap().as_deref(), Some("T1"));
    }

    #[test]
    fn test_unreadable_cookie_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("auth_token", "plain-token").unwrap();
        let jar = CookieJar::new(Box::new(store));

        assert_eq!(jar.get("auth_token").unwrap(), None);
    }

    #[test]
    fn test_remove_missing_cookie() {
        let jar = CookieJar::in_memory();
        jar.remove("auth_token").unwrap();
        assert_eq!(jar.get("auth_token").unwrap(), None);
    }
}
