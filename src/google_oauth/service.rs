use super::endpoints::GoogleOauthEndpoints;
use crate::config::Config;
use crate::error::RecordsError;
use crate::secrets::ServiceAccountCredential;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Tokens this close to expiry are replaced before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Build the outbound HTTP client shared by token exchange and Sheets reads.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, RecordsError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("waic-records/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// A bearer token for the Sheets API plus the client to send it with.
#[derive(Clone)]
pub struct AuthorizedSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    /// Service account the token was issued to.
    pub client_email: String,
    pub client: reqwest::Client,
}

impl std::fmt::Debug for AuthorizedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedSession")
            .field("client_email", &self.client_email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl AuthorizedSession {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

/// Authenticate as the service account.
pub async fn authenticate(
    credential: &ServiceAccountCredential,
    client: reqwest::Client,
) -> Result<AuthorizedSession, RecordsError> {
    let issued_at = Utc::now();
    let token = GoogleOauthEndpoints::exchange_jwt_assertion(credential, &client).await?;
    Ok(AuthorizedSession {
        access_token: token.access_token,
        expires_at: issued_at + ChronoDuration::seconds(token.expires_in),
        client_email: credential.client_email.clone(),
        client,
    })
}

/// Holds the process-wide session and re-authenticates once it goes stale.
pub struct SessionProvider {
    credential: Arc<ServiceAccountCredential>,
    client: reqwest::Client,
    current: Mutex<Option<AuthorizedSession>>,
}

impl SessionProvider {
    pub fn new(credential: Arc<ServiceAccountCredential>, client: reqwest::Client) -> Self {
        Self {
            credential,
            client,
            current: Mutex::new(None),
        }
    }

    pub async fn session(&self) -> Result<AuthorizedSession, RecordsError> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref().filter(|s| s.is_fresh(Utc::now())) {
            debug!(expires_at = %session.expires_at, "reusing service account session");
            return Ok(session.clone());
        }

        match authenticate(&self.credential, self.client.clone()).await {
            Ok(session) => {
                info!(
                    client_email = %self.credential.client_email,
                    expires_at = %session.expires_at,
                    "service account authenticated"
                );
                *current = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                error!(
                    client_email = %self.credential.client_email,
                    error = %e,
                    "service account authentication failed"
                );
                *current = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_in(secs: i64, now: DateTime<Utc>) -> AuthorizedSession {
        AuthorizedSession {
            access_token: "tok".to_string(),
            expires_at: now + ChronoDuration::seconds(secs),
            client_email: "reader@example.iam.gserviceaccount.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn session_goes_stale_inside_the_margin() {
        let now = Utc::now();
        assert!(session_expiring_in(3600, now).is_fresh(now));
        assert!(!session_expiring_in(30, now).is_fresh(now));
        assert!(!session_expiring_in(-5, now).is_fresh(now));
    }

    #[test]
    fn debug_omits_the_token() {
        let rendered = format!("{:?}", session_expiring_in(3600, Utc::now()));
        assert!(!rendered.contains("tok\""));
    }
}
