use crate::config::{JWT_BEARER_GRANT, SHEETS_READONLY_SCOPE};
use crate::error::RecordsError;
use crate::secrets::ServiceAccountCredential;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Stateless Google OAuth Endpoints.
pub(super) struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    /// Trade a signed JWT assertion for an access token at `token_uri`.
    pub(super) async fn exchange_jwt_assertion(
        creds: &ServiceAccountCredential,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, RecordsError> {
        let assertion = build_assertion(creds, Utc::now())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let resp = http_client
            .post(creds.token_uri.as_str())
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| RecordsError::Authentication(format!("token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                })
                .unwrap_or_else(|_| format!("token endpoint returned {status}"));
            return Err(RecordsError::Authentication(reason));
        }

        let token: GoogleTokenResponse = resp
            .json()
            .await
            .map_err(|e| RecordsError::Authentication(format!("unreadable token response: {e}")))?;
        if token.access_token.is_empty() {
            return Err(RecordsError::Authentication(
                "token response carried no access_token".to_string(),
            ));
        }
        info!(
            "Project_ID: {}, service account token issued for {}s",
            creds.project_id, token.expires_in
        );
        Ok(token)
    }
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    kid: &'a str,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(super) struct JwtClaims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub exp: i64,
    pub iat: i64,
}

/// RS256-signed assertion: `header.claims.signature`, each part base64url.
pub(super) fn build_assertion(
    creds: &ServiceAccountCredential,
    now: DateTime<Utc>,
) -> Result<String, RecordsError> {
    let header = JwtHeader {
        alg: "RS256",
        typ: "JWT",
        kid: &creds.private_key_id,
    };
    let claims = JwtClaims {
        iss: &creds.client_email,
        scope: SHEETS_READONLY_SCOPE,
        aud: &creds.token_uri,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    };

    let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{header_b64}.{claims_b64}");

    let key_pair = creds.signing_key()?;
    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .map_err(|_| RecordsError::Authentication("failed to sign token assertion".to_string()))?;

    Ok(format!(
        "{signing_input}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(&signature)
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
