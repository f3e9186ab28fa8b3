use crate::error::RecordsError;
use serde::Deserialize;
use std::fmt;

pub(super) const SECTION: &str = "app_credentials";

pub const MIN_COOKIE_KEY_LEN: usize = 32;

/// Shared login password and the key that encrypts the session cookie.
#[derive(Clone, Deserialize)]
pub struct AppCredentials {
    pub password: String,
    pub cookie_encryption_key: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("password", &"<redacted>")
            .field("cookie_encryption_key", &"<redacted>")
            .finish()
    }
}

impl AppCredentials {
    pub(super) fn validated(self) -> Result<Self, RecordsError> {
        if self.password.trim().is_empty() {
            return Err(RecordsError::missing(SECTION, Some("password")));
        }
        if self.cookie_encryption_key.trim().is_empty() {
            return Err(RecordsError::missing(SECTION, Some("cookie_encryption_key")));
        }
        let len = self.cookie_encryption_key.chars().count();
        if len < MIN_COOKIE_KEY_LEN {
            return Err(RecordsError::malformed(
                "app_credentials.cookie_encryption_key",
                format!("must be at least {MIN_COOKIE_KEY_LEN} characters, got {len}"),
            ));
        }
        Ok(self)
    }
}
