//! Application credentials
//!
//! The messaging service identifies an application by three values: an
//! application id, a public key, and a shared signing secret. All three are
//! required up front; there is no process-global fallback.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("application id must not be empty")]
    MissingAppId,

    #[error("application key must not be empty")]
    MissingKey,

    #[error("application secret must not be empty")]
    MissingSecret,
}

/// Credentials for the messaging application this service fronts
#[derive(Clone)]
pub struct Credentials {
    /// Application id, used by outbound clients sharing this configuration
    pub app_id: String,
    /// Public application key, embedded in tokens and client bootstrap data
    pub key: String,
    /// Shared signing secret
    pub secret: String,
}

impl Credentials {
    /// Create credentials. Every field is required and checked at
    /// construction time.
    pub fn new(
        app_id: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let app_id = app_id.into();
        let key = key.into();
        let secret = secret.into();

        if app_id.is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        if key.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(Self { app_id, key, secret })
    }

    /// Read credentials from `PUSHER_APP_ID`, `PUSHER_KEY` and
    /// `PUSHER_SECRET`. An unset variable behaves like an empty value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            std::env::var("PUSHER_APP_ID").unwrap_or_default(),
            std::env::var("PUSHER_KEY").unwrap_or_default(),
            std::env::var("PUSHER_SECRET").unwrap_or_default(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
